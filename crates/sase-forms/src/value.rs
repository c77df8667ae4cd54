//! Value model
//!
//! Form values travel as JSON. Absent keys, `null` and the empty string all
//! mean "no value". The empty string is also the representation a control
//! holds while nothing is entered, including numeric controls: a missing
//! number is never coerced to `0`.

use serde_json::{Map, Value};

/// Values of one form keyed by field name
pub type FormValues = Map<String, Value>;

/// What a control holds when nothing has been entered
pub const NO_VALUE: &str = "";

/// A raw value sorted into the shapes the rules care about
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue<'a> {
    /// Absent, `null`, or the empty string
    Empty,
    Text(&'a str),
    Number(f64),
    Bool(bool),
    /// Arrays and objects
    Composite(&'a Value),
}

impl<'a> RawValue<'a> {
    /// Classify an optional JSON value
    pub fn classify(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Empty,
            Some(Value::String(s)) if s.is_empty() => Self::Empty,
            Some(Value::String(s)) => Self::Text(s),
            Some(v) if v.is_number() => v.as_f64().map_or(Self::Composite(v), Self::Number),
            Some(Value::Bool(b)) => Self::Bool(*b),
            Some(other) => Self::Composite(other),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Whether a value counts as "no value"
pub fn is_blank(value: Option<&Value>) -> bool {
    RawValue::classify(value).is_empty()
}

/// String a control shows for `value`
///
/// Missing values become [`NO_VALUE`]; numbers use their JSON text so `0`
/// stays `"0"` only when a zero was actually entered.
pub fn control_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => NO_VALUE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Parse a numeric input, accepting JSON numbers and numeric strings
pub fn parse_number(raw: RawValue<'_>) -> Option<f64> {
    let parsed = match raw {
        RawValue::Number(n) => n,
        RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    parsed.is_finite().then_some(parsed)
}
