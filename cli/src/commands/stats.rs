//! Stats command

use anyhow::Result;
use sase_forms::FormStatistics;
use std::path::Path;
use tabled::Tabled;

use super::read_store;
use crate::output::OutputFormat;

#[derive(Tabled)]
struct FormRow {
    #[tabled(rename = "Form")]
    title: String,
    #[tabled(rename = "Submissions")]
    count: u64,
    #[tabled(rename = "Fields")]
    fields: String,
}

fn rows(stats: &FormStatistics) -> Vec<FormRow> {
    stats
        .forms
        .iter()
        .map(|form| FormRow {
            title: form.title.clone(),
            count: form.count,
            fields: form.fields.join(", "),
        })
        .collect()
}

pub fn handle(store: &Path, format: OutputFormat) -> Result<()> {
    let stats = FormStatistics::from_records(&read_store(store)?);
    if format.is_table() {
        println!(
            "{} submission(s) across {} form(s)",
            stats.total_submissions, stats.total_forms
        );
    }
    format.print(&stats, rows)
}
