//! Config commands

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::Path;
use tabled::Tabled;

use crate::config::Config;
use crate::output::OutputFormat;
use crate::ConfigCommands;

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn rows(config: &Config) -> Vec<SettingRow> {
    let not_set = || "(not set)".to_string();
    let text = &config.display;
    vec![
        ("default_format", config.default_format.map(|f| format!("{:?}", f).to_lowercase()).unwrap_or_else(not_set)),
        ("store", config.store.as_ref().map(|p| p.display().to_string()).unwrap_or_else(not_set)),
        ("display.not_entered", text.not_entered.clone()),
        ("display.yes", text.yes.clone()),
        ("display.no", text.no.clone()),
        ("display.missing_date", text.missing_date.clone()),
        ("display.untitled_submission", text.untitled_submission.clone()),
    ]
    .into_iter()
    .map(|(key, value)| SettingRow { key: key.to_string(), value })
    .collect()
}

pub fn handle(action: ConfigCommands, config: &Config, profile: Option<&str>, format: OutputFormat) -> Result<()> {
    let path = Config::config_path(profile)?;
    match action {
        ConfigCommands::Show => {
            if format.is_table() {
                let state = if path.exists() { "" } else { " (not created, showing defaults)" };
                println!("{}{}", path.display(), state);
            }
            format.print(config, rows)?;
        }
        ConfigCommands::Init { force } => {
            init(&path, force)?;
            println!("{} {}", "Configuration initialized at".green(), path.display());
        }
    }
    Ok(())
}

fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to replace it)", path.display());
    }
    Config::default()
        .save_to(path)
        .with_context(|| format!("initializing {}", path.display()))
}
