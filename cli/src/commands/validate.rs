//! Validate command

use anyhow::{Context, Result};
use colored::Colorize;
use sase_forms::{FormSession, ValidationOutcome};
use std::path::Path;
use tabled::Tabled;

use super::{read_schema, read_values};
use crate::output::{cell, OutputFormat};

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Message")]
    message: String,
}

fn rows(outcome: &ValidationOutcome) -> Vec<FieldRow> {
    outcome
        .fields()
        .iter()
        .map(|f| FieldRow {
            field: f.field.clone(),
            status: if f.error.is_some() { "invalid" } else { "ok" },
            message: cell(f.error.as_deref()),
        })
        .collect()
}

/// Returns whether every field passed
pub fn handle(schema: &Path, values: &Path, format: OutputFormat) -> Result<bool> {
    let outcome = run(schema, values)?;
    format.print(&outcome, rows)?;

    if outcome.is_valid() {
        eprintln!("{}", "form is valid".green());
    } else {
        eprintln!("{}", format!("{} field(s) invalid", outcome.errors().count()).red());
    }
    Ok(outcome.is_valid())
}

fn run(schema: &Path, values: &Path) -> Result<ValidationOutcome> {
    let schema = read_schema(schema)?;
    let values = read_values(values)?;

    let session = FormSession::new();
    let form = session.load_schema(schema).context("form could not be loaded")?;
    Ok(form.validate(&values))
}
