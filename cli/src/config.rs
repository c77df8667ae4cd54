//! CLI Configuration

use anyhow::{Context, Result};
use sase_forms::DisplayText;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

/// Submissions file used when neither flag, env nor config names one
const DEFAULT_STORE: &str = "forms-submissions.json";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    pub default_format: Option<OutputFormat>,
    pub store: Option<PathBuf>,
    /// Overrides for placeholders shown in submission listings
    #[serde(default)]
    pub display: DisplayText,
}

impl Config {
    pub fn load(profile: Option<&str>) -> Result<Self> {
        let path = Self::config_path(profile)?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("encoding config")?;
        fs::write(path, content).with_context(|| format!("writing config {}", path.display()))
    }

    /// Flag or env value first, then the config file, then the default
    pub fn store_path(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.store.clone())
            .unwrap_or_else(|| Self::base_dir().join(DEFAULT_STORE))
    }

    pub fn config_path(profile: Option<&str>) -> Result<PathBuf> {
        let home = dirs::home_dir().context("cannot find home directory")?;
        let filename = match profile {
            Some(p) => format!("forms.{}.toml", p),
            None => "forms.toml".to_string(),
        };
        Ok(home.join(".opensase").join(filename))
    }

    fn base_dir() -> PathBuf {
        dirs::home_dir()
            .map(|home| home.join(".opensase"))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
