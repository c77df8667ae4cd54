//! Submit command

use anyhow::{Context, Result};
use colored::Colorize;
use sase_forms::{FormSession, FormState, InMemorySubmissionRepository, SubmissionRepository, SubmitOutcome};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tabled::Tabled;

use super::{read_schema, read_store, read_values, write_store};
use crate::output::OutputFormat;

/// Printable summary of a submit attempt
#[derive(Debug, Serialize)]
pub struct SubmitReport {
    pub status: &'static str,
    pub message: String,
    pub errors: BTreeMap<String, String>,
}

impl SubmitReport {
    fn is_accepted(&self) -> bool {
        self.status == "accepted"
    }
}

impl From<SubmitOutcome> for SubmitReport {
    fn from(outcome: SubmitOutcome) -> Self {
        match outcome {
            SubmitOutcome::Invalid(outcome) => Self {
                status: "invalid",
                message: "Form has errors".into(),
                errors: outcome
                    .errors()
                    .map(|(field, message)| (field.to_string(), message.to_string()))
                    .collect(),
            },
            SubmitOutcome::Accepted { message } => Self {
                status: "accepted",
                message,
                errors: BTreeMap::new(),
            },
            SubmitOutcome::Rejected { message, errors } => Self {
                status: "rejected",
                message,
                errors: errors.into_iter().collect(),
            },
            SubmitOutcome::Discarded => Self {
                status: "discarded",
                message: "Form changed before the store answered".into(),
                errors: BTreeMap::new(),
            },
        }
    }
}

#[derive(Tabled)]
struct ErrorRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Error")]
    error: String,
}

fn rows(report: &SubmitReport) -> Vec<ErrorRow> {
    report
        .errors
        .iter()
        .map(|(field, error)| ErrorRow {
            field: field.clone(),
            error: error.clone(),
        })
        .collect()
}

/// Returns whether the store accepted the submission
pub async fn handle(schema: &Path, values: &Path, store: &Path, format: OutputFormat) -> Result<bool> {
    let report = run(schema, values, store).await?;

    if format.is_table() {
        let line = format!("{}: {}", report.status, report.message);
        if report.is_accepted() {
            println!("{}", line.green());
        } else {
            println!("{}", line.red());
        }
        if !report.errors.is_empty() {
            format.print(&report, rows)?;
        }
    } else {
        format.print(&report, rows)?;
    }
    Ok(report.is_accepted())
}

async fn run(schema: &Path, values: &Path, store: &Path) -> Result<SubmitReport> {
    let schema = read_schema(schema)?;
    let values = read_values(values)?;
    let repository = InMemorySubmissionRepository::with_records(read_store(store)?);

    let session = FormSession::new();
    let form = session.load_schema(schema).context("form could not be loaded")?;
    let mut state = FormState::new(&form);
    for (name, value) in values {
        state.set_value(&name, value);
    }

    let report = SubmitReport::from(session.submit(&mut state, &repository).await?);
    if report.is_accepted() {
        write_store(store, &repository.list().await?)?;
    }
    Ok(report)
}
