//! Submission Label Resolver
//!
//! Stored submissions carry label metadata in one of three historical shapes.
//! Each record's mapping is normalized once into a [`LabelLookup`]; the
//! resolvers below then fall back to the live schema and finally to the raw
//! field name or value. Resolution never fails: a stored submission must
//! always be viewable even after its schema changed or disappeared.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::display::DisplayText;
use crate::field::{FieldType, FormSchema};
use crate::value::RawValue;

// =============================================================================
// Stored Shapes
// =============================================================================

/// `fields_mapping` as stored next to a submission
///
/// An object is the current shape when it holds a `fields_mapping` or
/// `selected_options_labels` object, otherwise the flat shape.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldsMapping {
    /// Current shape: labels plus pre-resolved option labels
    Nested(NestedMapping),
    /// Oldest shape: ordered `{name, label}` entries
    Legacy(Vec<LegacyEntry>),
    /// Intermediate shape: field name to label
    Flat(Map<String, Value>),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NestedMapping {
    #[serde(default)]
    pub fields_mapping: Map<String, Value>,
    /// Field name to the label (or labels, for multi-select) that was chosen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_options_labels: Option<Map<String, Value>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

const NESTED_KEYS: [&str; 2] = ["fields_mapping", "selected_options_labels"];

impl<'de> Deserialize<'de> for FieldsMapping {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Array(items) => serde_json::from_value(Value::Array(items))
                .map(Self::Legacy)
                .map_err(de::Error::custom),
            Value::Object(map) if NESTED_KEYS.iter().any(|k| map.get(*k).is_some_and(Value::is_object)) => {
                serde_json::from_value(Value::Object(map))
                    .map(Self::Nested)
                    .map_err(de::Error::custom)
            }
            Value::Object(map) => Ok(Self::Flat(map)),
            other => Err(de::Error::custom(format!(
                "fields mapping must be an object or an array, got {other}"
            ))),
        }
    }
}

impl FieldsMapping {
    /// Current-shape mapping for values submitted against `schema`
    ///
    /// Dropdown values that match an option get that option's label recorded,
    /// so the submission stays readable if the options change later.
    pub fn capture(schema: &FormSchema, values: &Map<String, Value>) -> Self {
        let mut labels = Map::new();
        let mut selected = Map::new();

        for field in &schema.fields {
            labels.insert(field.name.clone(), Value::String(field.label.clone()));
            if field.field_type != FieldType::Dropdown {
                continue;
            }
            let chosen = values.get(&field.name).and_then(Value::as_str);
            if let Some(label) = chosen.and_then(|v| field.option_label(v)) {
                selected.insert(field.name.clone(), Value::String(label.to_string()));
            }
        }

        Self::Nested(NestedMapping {
            fields_mapping: labels,
            selected_options_labels: Some(selected),
        })
    }
}

// =============================================================================
// Normalized Lookup
// =============================================================================

/// Pre-resolved label of a chosen option
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionLabel {
    Single(String),
    /// Multi-select: shown as a comma-separated list
    Multiple(Vec<String>),
}

impl OptionLabel {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Array(items) => Some(Self::Multiple(items.iter().map(scalar_text).collect())),
            other => Some(Self::Single(scalar_text(other))),
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Single(label) => label.clone(),
            Self::Multiple(labels) => labels.join(", "),
        }
    }
}

/// One submission's label metadata, whatever shape it was stored in
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelLookup {
    labels: Vec<(String, String)>,
    option_labels: HashMap<String, OptionLabel>,
}

impl LabelLookup {
    pub fn from_mapping(mapping: &FieldsMapping) -> Self {
        match mapping {
            FieldsMapping::Nested(nested) => Self {
                labels: map_labels(&nested.fields_mapping),
                option_labels: nested
                    .selected_options_labels
                    .iter()
                    .flatten()
                    .filter_map(|(name, value)| {
                        OptionLabel::from_value(value).map(|label| (name.clone(), label))
                    })
                    .collect(),
            },
            FieldsMapping::Legacy(entries) => Self {
                labels: entries
                    .iter()
                    .filter_map(|e| Some((e.name.clone()?, e.label.clone()?)))
                    .collect(),
                option_labels: HashMap::new(),
            },
            FieldsMapping::Flat(map) => Self {
                labels: map_labels(map),
                option_labels: HashMap::new(),
            },
        }
    }

    /// Stored label for a field (first entry wins)
    pub fn label(&self, field_name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(name, _)| name == field_name)
            .map(|(_, label)| label.as_str())
    }

    pub fn option_label(&self, field_name: &str) -> Option<&OptionLabel> {
        self.option_labels.get(field_name)
    }

    /// Stored labels in mapping order
    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(n, l)| (n.as_str(), l.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.option_labels.is_empty()
    }
}

impl From<&FieldsMapping> for LabelLookup {
    fn from(mapping: &FieldsMapping) -> Self {
        Self::from_mapping(mapping)
    }
}

fn map_labels(map: &Map<String, Value>) -> Vec<(String, String)> {
    map.iter()
        .filter(|(_, label)| !label.is_null())
        .map(|(name, label)| (name.clone(), scalar_text(label)))
        .collect()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Human-readable label for a stored field
///
/// Stored mapping first, then the live schema, then the name itself.
pub fn resolve_label(
    field_name: &str,
    lookup: Option<&LabelLookup>,
    schema: Option<&FormSchema>,
) -> String {
    lookup
        .and_then(|l| l.label(field_name))
        .or_else(|| schema.and_then(|s| s.field(field_name)).map(|f| f.label.as_str()))
        .unwrap_or(field_name)
        .to_string()
}

/// Human-readable value for a stored field
pub fn resolve_value(
    field_name: &str,
    raw: Option<&Value>,
    lookup: Option<&LabelLookup>,
    schema: Option<&FormSchema>,
    text: &DisplayText,
) -> String {
    let kind = RawValue::classify(raw);
    if kind.is_empty() {
        return text.not_entered.clone();
    }

    if let Some(stored) = lookup.and_then(|l| l.option_label(field_name)) {
        return stored.display();
    }

    // Best effort: the options may have changed since the submission.
    let dropdown = schema
        .and_then(|s| s.field(field_name))
        .filter(|f| f.field_type == FieldType::Dropdown);
    if let (Some(field), Some(key)) = (dropdown, raw.filter(|v| !v.is_object() && !v.is_array())) {
        if let Some(label) = field.option_label(&scalar_text(key)) {
            return label.to_string();
        }
    }

    match kind {
        RawValue::Bool(b) => text.boolean(b).to_string(),
        RawValue::Text(s) => s.to_string(),
        RawValue::Composite(v) => v.to_string(),
        RawValue::Number(_) | RawValue::Empty => raw.map(scalar_text).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{DropdownOption, FieldDescriptor};
    use serde_json::json;

    fn lookup(value: Value) -> LabelLookup {
        let mapping: FieldsMapping = serde_json::from_value(value).unwrap();
        LabelLookup::from_mapping(&mapping)
    }

    fn age_schema() -> FormSchema {
        FormSchema::new("T", vec![FieldDescriptor::new("age", "Age", "number")])
    }

    #[test]
    fn test_shapes_are_detected() {
        let legacy: FieldsMapping = serde_json::from_value(json!([{"name": "age", "label": "Age"}])).unwrap();
        assert!(matches!(legacy, FieldsMapping::Legacy(_)));

        let flat: FieldsMapping = serde_json::from_value(json!({"age": "Age"})).unwrap();
        assert!(matches!(flat, FieldsMapping::Flat(_)));

        let nested: FieldsMapping =
            serde_json::from_value(json!({"fields_mapping": {"age": "Age"}})).unwrap();
        assert!(matches!(nested, FieldsMapping::Nested(_)));
    }

    #[test]
    fn test_option_labels_without_field_labels() {
        let mapping: FieldsMapping =
            serde_json::from_value(json!({"selected_options_labels": {"plan": "Pro"}})).unwrap();
        assert!(matches!(mapping, FieldsMapping::Nested(_)));

        let lookup = LabelLookup::from_mapping(&mapping);
        assert!(lookup.label("selected_options_labels").is_none());
        assert_eq!(lookup.option_label("plan").map(OptionLabel::display), Some("Pro".to_string()));
        assert_eq!(
            resolve_value("plan", Some(&json!("b")), Some(&lookup), None, &DisplayText::default()),
            "Pro"
        );
    }

    #[test]
    fn test_scalar_mapping_rejected() {
        assert!(serde_json::from_value::<FieldsMapping>(json!("labels")).is_err());
    }

    #[test]
    fn test_label_from_every_shape() {
        let legacy = lookup(json!([{"name": "age", "label": "Age"}]));
        let flat = lookup(json!({"age": "Age"}));
        let nested = lookup(json!({"fields_mapping": {"age": "Age"}}));
        let schema = age_schema();

        assert_eq!(resolve_label("age", Some(&legacy), None), "Age");
        assert_eq!(resolve_label("age", Some(&flat), None), "Age");
        assert_eq!(resolve_label("age", Some(&nested), None), "Age");
        assert_eq!(resolve_label("age", None, Some(&schema)), "Age");
        assert_eq!(resolve_label("age", None, None), "age");
    }

    #[test]
    fn test_label_prefers_stored_over_schema() {
        let flat = lookup(json!({"age": "Age at signup"}));
        let schema = age_schema();
        assert_eq!(resolve_label("age", Some(&flat), Some(&schema)), "Age at signup");
        // miss in the mapping falls through to the schema
        let other = lookup(json!({"name": "Name"}));
        assert_eq!(resolve_label("age", Some(&other), Some(&schema)), "Age");
    }

    #[test]
    fn test_legacy_entries_without_name_are_skipped() {
        let legacy = lookup(json!([{"label": "Orphan"}, {"name": "age", "label": "Age"}, {"name": "age", "label": "Later"}]));
        assert_eq!(legacy.labels().count(), 2);
        assert_eq!(legacy.label("age"), Some("Age"));
    }

    #[test]
    fn test_value_placeholders() {
        let text = DisplayText::default();
        assert_eq!(resolve_value("x", None, None, None, &text), "Not entered");
        assert_eq!(resolve_value("x", Some(&Value::Null), None, None, &text), "Not entered");
        assert_eq!(resolve_value("x", Some(&json!("")), None, None, &text), "Not entered");
        assert_eq!(resolve_value("x", Some(&json!(true)), None, None, &text), "Yes");
        assert_eq!(resolve_value("x", Some(&json!(false)), None, None, &text), "No");
        assert_eq!(resolve_value("x", Some(&json!(42)), None, None, &text), "42");
        assert_eq!(resolve_value("x", Some(&json!(2.5)), None, None, &text), "2.5");
        assert_eq!(resolve_value("x", Some(&json!("hi")), None, None, &text), "hi");
        assert_eq!(resolve_value("x", Some(&json!({"a": 1})), None, None, &text), r#"{"a":1}"#);
    }

    #[test]
    fn test_stored_option_label_wins() {
        let text = DisplayText::default();
        let mapping = lookup(json!({
            "fields_mapping": {"choice": "Choice"},
            "selected_options_labels": {"choice": "Old Option"}
        }));

        assert_eq!(resolve_value("choice", Some(&json!("x")), Some(&mapping), None, &text), "Old Option");

        let schema = FormSchema::new(
            "T",
            vec![FieldDescriptor::new("choice", "Choice", "dropdown")
                .with_options(vec![DropdownOption::new("y", "New Option")])],
        );
        assert_eq!(
            resolve_value("choice", Some(&json!("x")), Some(&mapping), Some(&schema), &text),
            "Old Option"
        );
    }

    #[test]
    fn test_multi_select_labels_joined() {
        let text = DisplayText::default();
        let mapping = lookup(json!({
            "fields_mapping": {"tags": "Tags"},
            "selected_options_labels": {"tags": ["Red", "Green"]}
        }));
        assert_eq!(
            resolve_value("tags", Some(&json!(["r", "g"])), Some(&mapping), None, &text),
            "Red, Green"
        );
    }

    #[test]
    fn test_option_label_from_current_schema() {
        let text = DisplayText::default();
        let schema = FormSchema::new(
            "T",
            vec![FieldDescriptor::new("plan", "Plan", "dropdown").with_options(vec![
                DropdownOption::new("a", "Alpha"),
                DropdownOption::new("b", "Beta"),
            ])],
        );

        assert_eq!(resolve_value("plan", Some(&json!("b")), None, Some(&schema), &text), "Beta");
        // option removed since: raw value
        assert_eq!(resolve_value("plan", Some(&json!("z")), None, Some(&schema), &text), "z");
    }

    #[test]
    fn test_capture_records_labels_and_choices() {
        let schema = FormSchema::new(
            "T",
            vec![
                FieldDescriptor::new("name", "Name", "text"),
                FieldDescriptor::new("plan", "Plan", "dropdown")
                    .with_options(vec![DropdownOption::new("a", "Alpha")]),
            ],
        );
        let values = json!({"name": "Dana", "plan": "a"}).as_object().cloned().unwrap();

        let mapping = FieldsMapping::capture(&schema, &values);
        let lookup = LabelLookup::from_mapping(&mapping);

        let labels: Vec<_> = lookup.labels().collect();
        assert_eq!(labels, vec![("name", "Name"), ("plan", "Plan")]);
        assert_eq!(lookup.option_label("plan"), Some(&OptionLabel::Single("Alpha".into())));
        assert_eq!(lookup.option_label("name"), None);
    }
}
