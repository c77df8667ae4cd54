//! CLI Commands

pub mod config;
pub mod render;
pub mod stats;
pub mod submissions;
pub mod submit;
pub mod validate;

use anyhow::{bail, Context, Result};
use sase_forms::{FormSchema, FormValues, SubmissionRecord};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

pub fn read_schema(path: &Path) -> Result<FormSchema> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading schema {}", path.display()))?;
    FormSchema::from_json(&text).with_context(|| format!("parsing schema {}", path.display()))
}

/// Values file must hold a JSON object keyed by field name
pub fn read_values(path: &Path) -> Result<FormValues> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading values {}", path.display()))?;
    match serde_json::from_str(&text).with_context(|| format!("parsing values {}", path.display()))? {
        Value::Object(map) => Ok(map),
        _ => bail!("values in {} must be a JSON object", path.display()),
    }
}

/// Stored submissions; a missing file is an empty store
pub fn read_store(path: &Path) -> Result<Vec<SubmissionRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading submissions {}", path.display()))?;
    let records: Vec<SubmissionRecord> = serde_json::from_str(&text)
        .with_context(|| format!("parsing submissions {}", path.display()))?;
    debug!(path = %path.display(), records = records.len(), "loaded submissions");
    Ok(records)
}

pub fn write_store(path: &Path, records: &[SubmissionRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(records).context("encoding submissions")?;
    fs::write(path, text).with_context(|| format!("writing submissions {}", path.display()))
}
