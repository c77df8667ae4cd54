//! Stored submissions and their display form

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::display::DisplayText;
use crate::error::{FormsError, Result};
use crate::field::FormSchema;
use crate::labels::{resolve_label, resolve_value, FieldsMapping, LabelLookup};

/// Submitted field values as stored: JSON text or an already-parsed mapping
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmissionData {
    Parsed(Map<String, Value>),
    Encoded(String),
}

impl SubmissionData {
    /// Field values as a mapping
    pub fn decode(&self) -> Result<Map<String, Value>> {
        match self {
            Self::Parsed(map) => Ok(map.clone()),
            Self::Encoded(text) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(_) => Err(FormsError::InvalidSubmissionData(
                    "encoded data is not an object".into(),
                )),
                Err(e) => Err(FormsError::InvalidSubmissionData(e.to_string())),
            },
        }
    }
}

impl From<Map<String, Value>> for SubmissionData {
    fn from(map: Map<String, Value>) -> Self {
        Self::Parsed(map)
    }
}

/// A stored, read-only past submission
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    /// Stored either as text or as an integer key
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub form_title: String,
    pub data: SubmissionData,
    #[serde(default)]
    pub submitted_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields_mapping: Option<FieldsMapping>,
}

fn id_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

impl SubmissionRecord {
    /// Normalized label metadata, if the record has any
    pub fn label_lookup(&self) -> Option<LabelLookup> {
        self.fields_mapping.as_ref().map(LabelLookup::from_mapping)
    }
}

/// One resolved `label: value` line of a submission
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedEntry {
    pub name: String,
    pub label: String,
    pub value: String,
}

/// Presentation of one stored submission
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubmissionView {
    pub id: String,
    pub title: String,
    pub submitted_at: String,
    pub entries: Vec<ResolvedEntry>,
}

impl SubmissionView {
    /// Resolve every stored value of `record`
    ///
    /// `index` is the record's 0-based position, used for untitled records.
    /// Data that cannot be decoded is shown as a single raw entry.
    pub fn from_record(
        record: &SubmissionRecord,
        index: usize,
        schema: Option<&FormSchema>,
        text: &DisplayText,
    ) -> Self {
        let lookup = record.label_lookup();
        let entries = match record.data.decode() {
            Ok(data) => data
                .iter()
                .map(|(name, value)| ResolvedEntry {
                    name: name.clone(),
                    label: resolve_label(name, lookup.as_ref(), schema),
                    value: resolve_value(name, Some(value), lookup.as_ref(), schema, text),
                })
                .collect(),
            Err(e) => {
                warn!(submission = %record.id, error = %e, "undecodable submission data");
                let raw = match &record.data {
                    SubmissionData::Encoded(s) => s.clone(),
                    SubmissionData::Parsed(map) => Value::Object(map.clone()).to_string(),
                };
                vec![ResolvedEntry {
                    name: "data".into(),
                    label: "data".into(),
                    value: raw,
                }]
            }
        };

        let title = if record.form_title.trim().is_empty() {
            text.untitled(index + 1)
        } else {
            record.form_title.clone()
        };

        Self {
            id: record.id.clone(),
            title,
            submitted_at: format_timestamp(&record.submitted_at)
                .unwrap_or_else(|| text.missing_date.clone()),
            entries,
        }
    }

    /// Views for a list of records, in stored order
    pub fn from_records(
        records: &[SubmissionRecord],
        schema: Option<&FormSchema>,
        text: &DisplayText,
    ) -> Vec<Self> {
        records
            .iter()
            .enumerate()
            .map(|(i, record)| Self::from_record(record, i, schema, text))
            .collect()
    }
}

/// `dd/mm/YYYY HH:MM` for an RFC 3339 or naive ISO timestamp
pub fn format_timestamp(raw: &str) -> Option<String> {
    const DISPLAY: &str = "%d/%m/%Y %H:%M";
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format(DISPLAY).to_string())
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|dt| dt.format(DISPLAY).to_string())
        })
        .ok()
}
