//! Submission store interface
//!
//! Transport and persistence are external collaborators. The engine only
//! talks to them through [`SubmissionRepository`]; the in-memory
//! implementation backs tests and the CLI's file-based store.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::error::Result;
use crate::labels::FieldsMapping;
use crate::submission::{SubmissionData, SubmissionRecord};

/// A validated submission on its way to the store
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewSubmission {
    pub form_title: String,
    pub data: Map<String, Value>,
    pub fields_mapping: FieldsMapping,
}

/// Store's answer to a submission
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub success: bool,
    pub message: String,
    /// Field name to messages, only on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<HashMap<String, Vec<String>>>,
}

impl SubmissionResult {
    pub fn accepted(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            errors: None,
        }
    }

    pub fn rejected(message: impl Into<String>, errors: HashMap<String, Vec<String>>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: (!errors.is_empty()).then_some(errors),
        }
    }
}

/// Submission store
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Store a submission; rejection is a result, not an error
    async fn submit(&self, submission: NewSubmission) -> Result<SubmissionResult>;

    /// All stored submissions in insertion order
    async fn list(&self) -> Result<Vec<SubmissionRecord>>;

    /// Remove every stored submission
    async fn delete_all(&self) -> Result<()>;
}

/// Hex SHA-256 of the data with keys sorted at every level
///
/// Two submissions with the same values hash the same regardless of field
/// order.
pub fn fingerprint(data: &Map<String, Value>) -> String {
    fn canonical(value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<&String, Value> =
                    map.iter().map(|(k, v)| (k, canonical(v))).collect();
                Value::Object(sorted.into_iter().map(|(k, v)| (k.clone(), v)).collect())
            }
            Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
            other => other.clone(),
        }
    }

    let text = canonical(&Value::Object(data.clone())).to_string();
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// In-memory submission store (for testing and the CLI)
///
/// Rejects exact duplicates by fingerprint. It does not validate values.
pub struct InMemorySubmissionRepository {
    records: RwLock<Vec<(String, SubmissionRecord)>>,
}

impl InMemorySubmissionRepository {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Seed with previously stored records
    pub fn with_records(records: Vec<SubmissionRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| {
                let hash = record
                    .data
                    .decode()
                    .map(|data| fingerprint(&data))
                    .unwrap_or_default();
                (hash, record)
            })
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Default for InMemorySubmissionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubmissionRepository for InMemorySubmissionRepository {
    async fn submit(&self, submission: NewSubmission) -> Result<SubmissionResult> {
        let hash = fingerprint(&submission.data);
        let mut records = self.records.write();

        if records.iter().any(|(existing, _)| *existing == hash) {
            debug!(form = %submission.form_title, "duplicate submission rejected");
            return Ok(SubmissionResult {
                success: false,
                message: "An identical submission already exists".into(),
                errors: None,
            });
        }

        let record = SubmissionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            form_title: submission.form_title,
            data: SubmissionData::Parsed(submission.data),
            submitted_at: chrono::Utc::now().to_rfc3339(),
            fields_mapping: Some(submission.fields_mapping),
        };
        debug!(id = %record.id, form = %record.form_title, "submission stored");
        records.push((hash, record));

        Ok(SubmissionResult::accepted("Submission saved"))
    }

    async fn list(&self) -> Result<Vec<SubmissionRecord>> {
        Ok(self.records.read().iter().map(|(_, r)| r.clone()).collect())
    }

    async fn delete_all(&self) -> Result<()> {
        self.records.write().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn submission(data: Value) -> NewSubmission {
        NewSubmission {
            form_title: "Signup".into(),
            data: data.as_object().cloned().unwrap(),
            fields_mapping: FieldsMapping::Flat(Map::new()),
        }
    }

    #[test]
    fn test_fingerprint_ignores_key_order() {
        let a = json!({"a": 1, "b": {"y": 2, "x": 1}});
        let b = json!({"b": {"x": 1, "y": 2}, "a": 1});
        let c = json!({"a": 2, "b": {"x": 1, "y": 2}});

        let fa = fingerprint(a.as_object().unwrap());
        assert_eq!(fa, fingerprint(b.as_object().unwrap()));
        assert_ne!(fa, fingerprint(c.as_object().unwrap()));
        assert_eq!(fa.len(), 64);
    }

    #[tokio::test]
    async fn test_submit_and_list() {
        let repo = InMemorySubmissionRepository::new();

        let result = repo.submit(submission(json!({"email": "a@b.com"}))).await.unwrap();
        assert!(result.success);

        let records = repo.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].form_title, "Signup");
        assert!(records[0].fields_mapping.is_some());

        repo.delete_all().await.unwrap();
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let repo = InMemorySubmissionRepository::new();

        assert!(repo.submit(submission(json!({"a": 1, "b": 2}))).await.unwrap().success);
        let again = repo.submit(submission(json!({"b": 2, "a": 1}))).await.unwrap();

        assert!(!again.success);
        assert!(again.errors.is_none());
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_seeded_records_count_as_duplicates() {
        let existing: SubmissionRecord = serde_json::from_value(json!({
            "id": 1,
            "form_title": "Signup",
            "data": "{\"a\": 1}",
            "submitted_at": "2024-01-01T00:00:00"
        }))
        .unwrap();
        let repo = InMemorySubmissionRepository::with_records(vec![existing]);

        let result = repo.submit(submission(json!({"a": 1}))).await.unwrap();
        assert!(!result.success);
    }
}
