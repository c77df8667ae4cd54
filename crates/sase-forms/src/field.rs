//! Field Descriptor Model
//!
//! Declarative shape of a form as it arrives from an uploaded schema document.
//! Nothing here has behaviour beyond lookups; the compiler and the renderer
//! both consume these types.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::Result;

// =============================================================================
// Field Type
// =============================================================================

/// Declared type of a field
///
/// The set is closed. A tag outside of it is kept as [`FieldType::Unknown`] so
/// a partially unsupported schema still loads; such fields compile to a
/// permissive rule and render nothing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Text,
    Email,
    Password,
    Date,
    Number,
    Dropdown,
    Unknown(String),
}

impl FieldType {
    /// Wire tag of this type
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Password => "password",
            Self::Date => "date",
            Self::Number => "number",
            Self::Dropdown => "dropdown",
            Self::Unknown(tag) => tag,
        }
    }

    /// Whether the type is one the engine knows how to compile and render
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<String> for FieldType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "text" => Self::Text,
            "email" => Self::Email,
            "password" => Self::Password,
            "date" => Self::Date,
            "number" => Self::Number,
            "dropdown" => Self::Dropdown,
            _ => Self::Unknown(tag),
        }
    }
}

impl From<&str> for FieldType {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Unknown(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Constraints & Messages
// =============================================================================

/// Type-dependent constraint bag
///
/// String fields read `min_length`/`max_length`/`pattern`, numbers read
/// `min`/`max`, dates read `min_date`/`max_date` (`YYYY-MM-DD`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<String>,
}

/// Per-rule message overrides
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessages {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_option: Option<String>,
}

/// One dropdown choice: `value` goes on the wire, `label` is shown
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownOption {
    pub value: String,
    pub label: String,
}

impl DropdownOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

// =============================================================================
// Descriptor & Schema
// =============================================================================

/// Full contract of one form field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Stable key for values and errors
    pub name: String,
    /// Display text
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldValidation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_messages: Option<ErrorMessages>,
    /// Dropdown choices in display order
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub options: Vec<DropdownOption>,
}

impl FieldDescriptor {
    /// Create an optional, unconstrained field
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        field_type: impl Into<FieldType>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            field_type: field_type.into(),
            required: false,
            validation: None,
            error_messages: None,
            options: Vec::new(),
        }
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Attach a constraint bag
    pub fn with_validation(mut self, validation: FieldValidation) -> Self {
        self.validation = Some(validation);
        self
    }

    /// Attach message overrides
    pub fn with_messages(mut self, messages: ErrorMessages) -> Self {
        self.error_messages = Some(messages);
        self
    }

    /// Attach dropdown options
    pub fn with_options(mut self, options: Vec<DropdownOption>) -> Self {
        self.options = options;
        self
    }

    /// Label of the option whose value is `value`
    pub fn option_label(&self, value: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|opt| opt.value == value)
            .map(|opt| opt.label.as_str())
    }

    pub(crate) fn constraints(&self) -> FieldValidation {
        self.validation.clone().unwrap_or_default()
    }

    pub(crate) fn messages(&self) -> ErrorMessages {
        self.error_messages.clone().unwrap_or_default()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<DropdownOption>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Vec<DropdownOption>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A form as uploaded: a title and its fields in display order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    #[serde(default)]
    pub title: String,
    pub fields: Vec<FieldDescriptor>,
}

impl FormSchema {
    pub fn new(title: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            title: title.into(),
            fields,
        }
    }

    /// Parse a schema document
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Descriptor for `name` (last one wins when names repeat)
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().rev().find(|f| f.name == name)
    }

    /// Names that appear more than once, in order of their second appearance
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut dupes = Vec::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) && !dupes.contains(&field.name.as_str()) {
                dupes.push(field.name.as_str());
            }
        }
        dupes
    }
}
