//! Field Renderer Dispatcher
//!
//! Maps a field's declared type to the control that displays and edits it.
//! The input is an explicit [`FieldState`]; there is no shared UI state.

use serde::Serialize;
use serde_json::Value;

use crate::field::{FieldDescriptor, FieldType};
use crate::value::control_text;

/// Everything needed to render one field
#[derive(Clone, Copy, Debug)]
pub struct FieldState<'a> {
    pub field: &'a FieldDescriptor,
    pub value: Option<&'a Value>,
    pub touched: bool,
    /// Error from the compiled rule for the current value
    pub compiled_error: Option<&'a str>,
    /// Error returned by the server for the last submit attempt
    pub server_error: Option<&'a str>,
}

impl<'a> FieldState<'a> {
    /// Untouched state with no value and no errors
    pub fn new(field: &'a FieldDescriptor) -> Self {
        Self {
            field,
            value: None,
            touched: false,
            compiled_error: None,
            server_error: None,
        }
    }
}

/// Masking/keyboard hint for single-line text controls
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Text,
    Email,
    Password,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Password => "password",
        }
    }
}

/// Attributes every control carries
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ControlBase {
    pub name: String,
    pub label: String,
    /// Current value as text; empty string when nothing is entered
    pub value: String,
    pub required: bool,
    /// Message to show, present only once the field is touched
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Concrete control for one field
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum ControlDescription {
    /// Single-line input for text, email and password fields
    Text {
        #[serde(flatten)]
        base: ControlBase,
        input_type: InputType,
    },
    /// Date picker; the label is always shrunk above the chosen date
    Date {
        #[serde(flatten)]
        base: ControlBase,
        shrink_label: bool,
    },
    Number {
        #[serde(flatten)]
        base: ControlBase,
    },
    /// Single choice, options in schema order
    Select {
        #[serde(flatten)]
        base: ControlBase,
        options: Vec<SelectOption>,
    },
}

impl ControlDescription {
    pub fn base(&self) -> &ControlBase {
        match self {
            Self::Text { base, .. }
            | Self::Date { base, .. }
            | Self::Number { base }
            | Self::Select { base, .. } => base,
        }
    }

    /// Serialized tag of the control
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Date { .. } => "date",
            Self::Number { .. } => "number",
            Self::Select { .. } => "select",
        }
    }

    /// Error currently displayed on the control
    pub fn error(&self) -> Option<&str> {
        self.base().error.as_deref()
    }
}

/// Message to display: nothing until touched, then server over compiled
pub fn displayed_error<'a>(
    touched: bool,
    compiled_error: Option<&'a str>,
    server_error: Option<&'a str>,
) -> Option<&'a str> {
    if !touched {
        return None;
    }
    server_error.or(compiled_error)
}

/// Render one field; unknown types render nothing
pub fn render(state: &FieldState<'_>) -> Option<ControlDescription> {
    let field = state.field;
    let base = || ControlBase {
        name: field.name.clone(),
        label: field.label.clone(),
        value: control_text(state.value),
        required: field.required,
        error: displayed_error(state.touched, state.compiled_error, state.server_error)
            .map(str::to_string),
    };

    let control = match &field.field_type {
        FieldType::Text => ControlDescription::Text {
            base: base(),
            input_type: InputType::Text,
        },
        FieldType::Email => ControlDescription::Text {
            base: base(),
            input_type: InputType::Email,
        },
        FieldType::Password => ControlDescription::Text {
            base: base(),
            input_type: InputType::Password,
        },
        FieldType::Date => ControlDescription::Date {
            base: base(),
            shrink_label: true,
        },
        FieldType::Number => ControlDescription::Number { base: base() },
        FieldType::Dropdown => {
            let base = base();
            let options = field
                .options
                .iter()
                .map(|opt| SelectOption {
                    value: opt.value.clone(),
                    label: opt.label.clone(),
                    selected: opt.value == base.value,
                })
                .collect();
            ControlDescription::Select { base, options }
        }
        FieldType::Unknown(_) => return None,
    };
    Some(control)
}
