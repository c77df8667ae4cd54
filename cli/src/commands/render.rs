//! Render command

use anyhow::{Context, Result};
use sase_forms::{ControlDescription, FormSession, FormState};
use std::path::Path;
use tabled::Tabled;

use super::{read_schema, read_values};
use crate::output::{cell, OutputFormat};

#[derive(Tabled)]
struct ControlRow {
    #[tabled(rename = "Field")]
    name: String,
    #[tabled(rename = "Control")]
    control: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Required")]
    required: bool,
    #[tabled(rename = "Error")]
    error: String,
}

fn rows(controls: &[ControlDescription]) -> Vec<ControlRow> {
    controls
        .iter()
        .map(|control| {
            let base = control.base();
            let kind = match control {
                ControlDescription::Text { input_type, .. } => format!("text ({})", input_type.as_str()),
                ControlDescription::Select { options, .. } => format!("select ({} options)", options.len()),
                other => other.kind().to_string(),
            };
            ControlRow {
                name: base.name.clone(),
                control: kind,
                label: base.label.clone(),
                value: base.value.clone(),
                required: base.required,
                error: cell(base.error.as_deref()),
            }
        })
        .collect()
}

pub fn handle(schema: &Path, values: Option<&Path>, touched: bool, format: OutputFormat) -> Result<()> {
    let controls = run(schema, values, touched)?;
    format.print(&controls[..], rows)
}

fn run(schema: &Path, values: Option<&Path>, touched: bool) -> Result<Vec<ControlDescription>> {
    let schema = read_schema(schema)?;
    let values = values.map(read_values).transpose()?;

    let session = FormSession::new();
    let form = session.load_schema(schema).context("form could not be loaded")?;
    let mut state = FormState::new(&form);

    for (name, value) in values.into_iter().flatten() {
        state.set_value(&name, value);
    }
    if touched {
        for field in &form.schema().fields {
            state.touch(&field.name);
        }
    }

    Ok(state.render_all(&form))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::{write, SIGNUP};

    #[test]
    fn test_unknown_type_not_rendered() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write(dir.path(), "schema.json", SIGNUP);

        let controls = run(&schema, None, false).unwrap();

        let kinds: Vec<_> = controls.iter().map(|c| c.kind()).collect();
        assert_eq!(kinds, vec!["text", "number", "select"]);
        assert!(controls.iter().all(|c| c.error().is_none()));
    }

    #[test]
    fn test_touched_shows_errors() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write(dir.path(), "schema.json", SIGNUP);
        let values = write(dir.path(), "values.json", r#"{"age": 0}"#);

        let controls = run(&schema, Some(&values), true).unwrap();

        assert_eq!(controls[0].error(), Some("Email is required"));
        assert_eq!(controls[1].base().value, "0");
        assert_eq!(controls[1].error(), None);
    }
}
