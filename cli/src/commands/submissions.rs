//! Submissions command

use anyhow::Result;
use sase_forms::{DisplayText, SubmissionView};
use std::path::Path;
use tabled::Tabled;

use super::{read_schema, read_store};
use crate::output::OutputFormat;

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Submission")]
    title: String,
    #[tabled(rename = "Submitted")]
    submitted_at: String,
    #[tabled(rename = "Field")]
    label: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn rows(views: &[SubmissionView]) -> Vec<EntryRow> {
    views
        .iter()
        .flat_map(|view| {
            view.entries.iter().map(move |entry| EntryRow {
                title: view.title.clone(),
                submitted_at: view.submitted_at.clone(),
                label: entry.label.clone(),
                value: entry.value.clone(),
            })
        })
        .collect()
}

pub fn handle(store: &Path, schema: Option<&Path>, text: &DisplayText, format: OutputFormat) -> Result<()> {
    let views = run(store, schema, text)?;
    if views.is_empty() && format.is_table() {
        println!("No submissions in {}", store.display());
        return Ok(());
    }
    format.print(&views[..], rows)
}

fn run(store: &Path, schema: Option<&Path>, text: &DisplayText) -> Result<Vec<SubmissionView>> {
    let records = read_store(store)?;
    let schema = schema.map(read_schema).transpose()?;
    Ok(SubmissionView::from_records(&records, schema.as_ref(), text))
}
