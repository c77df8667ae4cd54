//! Schema Compiler
//!
//! Builds the whole rule set for a schema and runs it against a set of
//! values. A rule set is immutable: a changed schema gets a new one, never a
//! patched one, since a rule depends jointly on several descriptor attributes.

use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::Result;
use crate::field::FieldDescriptor;
use crate::rule::{compile_field, Rule};
use crate::value::FormValues;

/// Compiled rules for a schema, iterated in field order
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
}

impl RuleSet {
    /// Rule for a field name
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.index.get(name).map(|&i| &self.rules[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Validate every field; see [`validate`]
    pub fn validate(&self, values: &FormValues) -> ValidationOutcome {
        validate(self, values)
    }

    fn insert(&mut self, rule: Rule) {
        match self.index.get(rule.field()) {
            Some(&i) => {
                warn!(field = rule.field(), "duplicate field name, later definition wins");
                self.rules[i] = rule;
            }
            None => {
                self.index.insert(rule.field().to_string(), self.rules.len());
                self.rules.push(rule);
            }
        }
    }
}

/// Compile an ordered field list into a rule set
///
/// Duplicate names are last-write-wins: the later descriptor's rule replaces
/// the earlier one, keeping the earlier position. The first construction error
/// aborts compilation.
pub fn compile(fields: &[FieldDescriptor]) -> Result<RuleSet> {
    let mut set = RuleSet::default();
    for field in fields {
        set.insert(compile_field(field)?);
    }
    debug!(fields = fields.len(), rules = set.len(), "compiled rule set");
    Ok(set)
}

/// Per-field result of one validation pass
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldOutcome {
    pub field: String,
    pub error: Option<String>,
}

/// Outcome of validating a full set of values, in field order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    fields: Vec<FieldOutcome>,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.fields.iter().all(|f| f.error.is_none())
    }

    /// Error for a field, `None` when it passed or is unknown
    pub fn error(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.field == field)
            .and_then(|f| f.error.as_deref())
    }

    /// Failing fields only
    pub fn errors(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .filter_map(|f| f.error.as_deref().map(|e| (f.field.as_str(), e)))
    }

    /// Every field with its optional error
    pub fn fields(&self) -> &[FieldOutcome] {
        &self.fields
    }
}

/// Validate `values` against every rule in `rules`
///
/// Failures are captured per field and never stop the pass.
pub fn validate(rules: &RuleSet, values: &FormValues) -> ValidationOutcome {
    let fields = rules
        .iter()
        .map(|rule| FieldOutcome {
            field: rule.field().to_string(),
            error: rule.check(values.get(rule.field())),
        })
        .collect();
    ValidationOutcome { fields }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{DropdownOption, FieldValidation, FormSchema};
    use serde_json::json;

    fn values(v: serde_json::Value) -> FormValues {
        v.as_object().cloned().unwrap()
    }

    fn signup() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("email", "Email", "email").required(),
            FieldDescriptor::new("age", "Age", "number").with_validation(FieldValidation {
                min: Some(0.0),
                ..Default::default()
            }),
            FieldDescriptor::new("plan", "Plan", "dropdown").with_options(vec![
                DropdownOption::new("a", "Alpha"),
                DropdownOption::new("b", "Beta"),
            ]),
        ]
    }

    #[test]
    fn test_compile_keeps_field_order() {
        let rules = compile(&signup()).unwrap();
        let names: Vec<_> = rules.iter().map(|r| r.field()).collect();
        assert_eq!(names, vec!["email", "age", "plan"]);
        assert!(rules.get("age").is_some());
        assert!(rules.get("missing").is_none());
    }

    #[test]
    fn test_validate_collects_all_fields() {
        let rules = compile(&signup()).unwrap();
        let outcome = validate(&rules, &values(json!({"email": "", "age": 0, "plan": "c"})));

        assert!(!outcome.is_valid());
        assert_eq!(outcome.fields().len(), 3);
        assert_eq!(outcome.error("email"), Some("Email is required"));
        assert_eq!(outcome.error("age"), None);
        assert_eq!(outcome.error("plan"), Some("Plan must be one of the listed options"));
        assert_eq!(outcome.errors().count(), 2);
    }

    #[test]
    fn test_validate_passes_valid_values() {
        let rules = compile(&signup()).unwrap();
        let outcome = rules.validate(&values(json!({"email": "a@b.com", "age": "", "plan": "a"})));
        assert!(outcome.is_valid());
    }

    #[test]
    fn test_duplicate_names_last_write_wins() {
        let fields = vec![
            FieldDescriptor::new("contact", "Contact", "text"),
            FieldDescriptor::new("other", "Other", "text"),
            FieldDescriptor::new("contact", "Contact email", "email").required(),
        ];
        let rules = compile(&fields).unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules.iter().next().unwrap().field(), "contact");
        let outcome = rules.validate(&values(json!({"contact": "plain text"})));
        assert_eq!(
            outcome.error("contact"),
            Some("Contact email must be a valid email address")
        );
    }

    #[test]
    fn test_construction_error_aborts() {
        let schema = FormSchema::from_json(
            r#"{"title": "T", "fields": [
                {"name": "ok", "label": "Ok", "type": "text"},
                {"name": "bad", "label": "Bad", "type": "text", "validation": {"pattern": "("}}
            ]}"#,
        )
        .unwrap();
        assert!(compile(&schema.fields).is_err());
    }

    #[test]
    fn test_unknown_field_has_no_error() {
        let fields = vec![FieldDescriptor::new("sig", "Signature", "signature").required()];
        let rules = compile(&fields).unwrap();
        assert!(rules.validate(&FormValues::new()).is_valid());
    }
}
