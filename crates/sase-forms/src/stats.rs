//! Per-form submission statistics

use serde::Serialize;
use std::collections::HashMap;

use crate::submission::SubmissionRecord;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormStat {
    pub title: String,
    pub count: u64,
    /// Field labels from the latest submission that carried a mapping
    pub fields: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FormStatistics {
    pub total_submissions: u64,
    pub total_forms: u64,
    /// Most submitted first; ties keep first-seen order
    pub forms: Vec<FormStat>,
}

impl FormStatistics {
    pub fn from_records(records: &[SubmissionRecord]) -> Self {
        let mut forms: Vec<FormStat> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for record in records {
            let slot = *index.entry(record.form_title.as_str()).or_insert_with(|| {
                forms.push(FormStat {
                    title: record.form_title.clone(),
                    count: 0,
                    fields: Vec::new(),
                });
                forms.len() - 1
            });

            let stat = &mut forms[slot];
            stat.count += 1;
            if let Some(lookup) = record.label_lookup() {
                stat.fields = lookup.labels().map(|(_, label)| label.to_string()).collect();
            }
        }

        // stable sort keeps first-seen order among equal counts
        forms.sort_by(|a, b| b.count.cmp(&a.count));

        Self {
            total_submissions: records.len() as u64,
            total_forms: forms.len() as u64,
            forms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(title: &str, mapping: serde_json::Value) -> SubmissionRecord {
        let mut value = json!({"id": "x", "form_title": title, "data": {}, "submitted_at": ""});
        if !mapping.is_null() {
            value["fields_mapping"] = mapping;
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_counts_and_order() {
        let records = vec![
            record("Contact", json!(null)),
            record("Signup", json!([{"name": "a", "label": "Old A"}])),
            record("Signup", json!({"fields_mapping": {"a": "A", "b": "B"}})),
            record("Survey", json!({"q": "Question"})),
            record("Signup", json!(null)),
        ];

        let stats = FormStatistics::from_records(&records);

        assert_eq!(stats.total_submissions, 5);
        assert_eq!(stats.total_forms, 3);
        let titles: Vec<_> = stats.forms.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["Signup", "Contact", "Survey"]);
        assert_eq!(stats.forms[0].count, 3);
        assert_eq!(stats.forms[0].fields, vec!["A", "B"]);
        assert!(stats.forms[1].fields.is_empty());
        assert_eq!(stats.forms[2].fields, vec!["Question"]);
    }

    #[test]
    fn test_empty() {
        let stats = FormStatistics::from_records(&[]);
        assert_eq!(stats, FormStatistics::default());
    }
}
