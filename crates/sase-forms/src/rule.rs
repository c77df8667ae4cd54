//! Constraint Compiler
//!
//! Turns one [`FieldDescriptor`] into an executable [`Rule`]. Compilation is
//! pure and deterministic; the only construction failures are a malformed
//! `pattern` and an unparsable date bound, both reported to the caller.
//!
//! Check order for a value:
//!
//! ```text
//!   empty? ──yes──► required message (or pass)
//!     │no
//!     ▼
//!   type parse (number / date) ──fail──► type message
//!     │ok
//!     ▼
//!   constraints in declaration order ──first failure──► its message
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::LazyLock;
use tracing::warn;

use crate::error::{FormsError, Result};
use crate::field::{FieldDescriptor, FieldType};
use crate::value::{parse_number, RawValue};

/// Structural email check applied to `email` fields
pub const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"));

/// Wire format of date values and date bounds
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Rule
// =============================================================================

/// Compiled validation rule for one field
#[derive(Clone, Debug)]
pub struct Rule {
    field: String,
    field_type: FieldType,
    base: Base,
    required: Option<String>,
    checks: Vec<Check>,
}

/// How a non-empty value is read before constraints run
#[derive(Clone, Debug)]
enum Base {
    Text { invalid: String },
    Date { invalid: String },
    Number { invalid: String },
    /// Unknown field types: anything goes
    Any,
}

#[derive(Clone, Debug)]
enum Check {
    MinLength { len: usize, message: String },
    MaxLength { len: usize, message: String },
    /// Schema-supplied pattern; may use lookaround and backreferences
    Pattern { regex: fancy_regex::Regex, message: String },
    Email { regex: Regex, message: String },
    Min { bound: f64, message: String },
    Max { bound: f64, message: String },
    MinDate { bound: NaiveDate, message: String },
    MaxDate { bound: NaiveDate, message: String },
    OneOf { values: Vec<String>, message: String },
}

/// A non-empty value after its type parse
enum Parsed<'a> {
    Text(Cow<'a, str>),
    Number(f64),
    Date(NaiveDate),
}

impl Check {
    fn violated(&self, parsed: &Parsed<'_>) -> bool {
        match (self, parsed) {
            (Self::MinLength { len, .. }, Parsed::Text(s)) => s.chars().count() < *len,
            (Self::MaxLength { len, .. }, Parsed::Text(s)) => s.chars().count() > *len,
            (Self::Pattern { regex, .. }, Parsed::Text(s)) => match regex.is_match(s) {
                Ok(matched) => !matched,
                Err(e) => {
                    // backtrack limit hit: treat as a non-match
                    warn!(pattern = regex.as_str(), error = %e, "pattern evaluation failed");
                    true
                }
            },
            (Self::Email { regex, .. }, Parsed::Text(s)) => !regex.is_match(s),
            (Self::OneOf { values, .. }, Parsed::Text(s)) => !values.iter().any(|v| v == s),
            (Self::Min { bound, .. }, Parsed::Number(n)) => n < bound,
            (Self::Max { bound, .. }, Parsed::Number(n)) => n > bound,
            (Self::MinDate { bound, .. }, Parsed::Date(d)) => d < bound,
            (Self::MaxDate { bound, .. }, Parsed::Date(d)) => d > bound,
            _ => false,
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::MinLength { message, .. }
            | Self::MaxLength { message, .. }
            | Self::Pattern { message, .. }
            | Self::Email { message, .. }
            | Self::Min { message, .. }
            | Self::Max { message, .. }
            | Self::MinDate { message, .. }
            | Self::MaxDate { message, .. }
            | Self::OneOf { message, .. } => message,
        }
    }
}

impl Rule {
    /// Name of the field this rule belongs to
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn is_required(&self) -> bool {
        self.required.is_some()
    }

    /// Number of constraints beyond the required/type checks
    pub fn constraint_count(&self) -> usize {
        self.checks.len()
    }

    /// Validate one value, returning the first failing message
    pub fn check(&self, value: Option<&Value>) -> Option<String> {
        let raw = RawValue::classify(value);
        if raw.is_empty() {
            return self.required.clone();
        }

        let parsed = match &self.base {
            Base::Any => return None,
            Base::Text { invalid } => match raw {
                RawValue::Text(s) => Parsed::Text(Cow::Borrowed(s)),
                RawValue::Number(n) => Parsed::Text(Cow::Owned(n.to_string())),
                RawValue::Bool(b) => Parsed::Text(Cow::Owned(b.to_string())),
                RawValue::Composite(_) | RawValue::Empty => return Some(invalid.clone()),
            },
            Base::Number { invalid } => match parse_number(raw) {
                Some(n) => Parsed::Number(n),
                None => return Some(invalid.clone()),
            },
            Base::Date { invalid } => match raw {
                RawValue::Text(s) => match parse_date(s) {
                    Some(d) => Parsed::Date(d),
                    None => return Some(invalid.clone()),
                },
                _ => return Some(invalid.clone()),
            },
        };

        self.checks
            .iter()
            .find(|check| check.violated(&parsed))
            .map(|check| check.message().to_string())
    }
}

// =============================================================================
// Compilation
// =============================================================================

/// Compile one descriptor into its rule
pub fn compile_field(field: &FieldDescriptor) -> Result<Rule> {
    let constraints = field.constraints();
    let messages = field.messages();
    let label = field.label.as_str();
    let pick = |custom: &Option<String>, fallback: String| custom.clone().unwrap_or(fallback);

    let required = field
        .required
        .then(|| pick(&messages.required, defaults::required(label)));

    let mut checks = Vec::new();
    let base = match &field.field_type {
        FieldType::Text | FieldType::Password => {
            let password = field.field_type == FieldType::Password;

            if let Some(len) = constraints.min_length.filter(|len| *len > 0) {
                let fallback = if password {
                    defaults::password_min_length(label, len)
                } else {
                    defaults::min_length(label, len)
                };
                checks.push(Check::MinLength {
                    len,
                    message: pick(&messages.min_length, fallback),
                });
            }
            if !password {
                if let Some(len) = constraints.max_length.filter(|len| *len > 0) {
                    checks.push(Check::MaxLength {
                        len,
                        message: pick(&messages.max_length, defaults::max_length(label, len)),
                    });
                }
            }
            if let Some(pattern) = constraints.pattern.as_deref().filter(|p| !p.is_empty()) {
                let fallback = if password {
                    defaults::password_pattern(label)
                } else {
                    defaults::pattern(label)
                };
                checks.push(Check::Pattern {
                    regex: compile_pattern(&field.name, pattern)?,
                    message: pick(&messages.pattern, fallback),
                });
            }
            Base::Text {
                invalid: defaults::not_text(label),
            }
        }
        FieldType::Email => {
            checks.push(Check::Email {
                regex: EMAIL_REGEX.clone(),
                message: pick(&messages.email, defaults::email(label)),
            });
            Base::Text {
                invalid: defaults::email(label),
            }
        }
        FieldType::Date => {
            if let Some(raw) = constraints.min_date.as_deref() {
                let bound = parse_bound(&field.name, raw)?;
                checks.push(Check::MinDate {
                    bound,
                    message: pick(&messages.min_date, defaults::min_date(label, raw)),
                });
            }
            if let Some(raw) = constraints.max_date.as_deref() {
                let bound = parse_bound(&field.name, raw)?;
                checks.push(Check::MaxDate {
                    bound,
                    message: pick(&messages.max_date, defaults::max_date(label, raw)),
                });
            }
            Base::Date {
                invalid: defaults::not_date(label),
            }
        }
        FieldType::Number => {
            // Presence, not truthiness: a bound of 0 is still a bound.
            if let Some(bound) = constraints.min {
                checks.push(Check::Min {
                    bound,
                    message: pick(&messages.min, defaults::min(label, bound)),
                });
            }
            if let Some(bound) = constraints.max {
                checks.push(Check::Max {
                    bound,
                    message: pick(&messages.max, defaults::max(label, bound)),
                });
            }
            Base::Number {
                invalid: defaults::not_number(label),
            }
        }
        FieldType::Dropdown => {
            checks.push(Check::OneOf {
                values: field.options.iter().map(|opt| opt.value.clone()).collect(),
                message: pick(&messages.invalid_option, defaults::invalid_option(label)),
            });
            Base::Text {
                invalid: defaults::invalid_option(label),
            }
        }
        FieldType::Unknown(_) => Base::Any,
    };

    // Unknown types never fail, not even on required.
    let required = if matches!(base, Base::Any) { None } else { required };

    Ok(Rule {
        field: field.name.clone(),
        field_type: field.field_type.clone(),
        base,
        required,
        checks,
    })
}

/// Compile a schema pattern with JavaScript-style lookaround support
fn compile_pattern(field: &str, pattern: &str) -> Result<fancy_regex::Regex> {
    fancy_regex::Regex::new(pattern).map_err(|source| FormsError::InvalidPattern {
        field: field.to_string(),
        source: Box::new(source),
    })
}

fn parse_bound(field: &str, raw: &str) -> Result<NaiveDate> {
    parse_date(raw).ok_or_else(|| FormsError::InvalidDateBound {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

/// Parse a calendar date from `YYYY-MM-DD` or a timestamp carrying one
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Built-in messages. Each names the field and, where there is one, the bound.
mod defaults {
    pub fn required(label: &str) -> String {
        format!("{label} is required")
    }

    pub fn min_length(label: &str, len: usize) -> String {
        format!("{label} must be at least {len} characters")
    }

    pub fn max_length(label: &str, len: usize) -> String {
        format!("{label} must be at most {len} characters")
    }

    pub fn pattern(label: &str) -> String {
        format!("{label} has an invalid format")
    }

    pub fn password_min_length(label: &str, len: usize) -> String {
        format!("{label} must contain at least {len} characters")
    }

    pub fn password_pattern(label: &str) -> String {
        format!("{label} does not meet the password requirements")
    }

    pub fn not_text(label: &str) -> String {
        format!("{label} must be text")
    }

    pub fn email(label: &str) -> String {
        format!("{label} must be a valid email address")
    }

    pub fn not_date(label: &str) -> String {
        format!("{label} must be a valid date (YYYY-MM-DD)")
    }

    pub fn min_date(label: &str, bound: &str) -> String {
        format!("{label} must be on or after {bound}")
    }

    pub fn max_date(label: &str, bound: &str) -> String {
        format!("{label} must be on or before {bound}")
    }

    pub fn not_number(label: &str) -> String {
        format!("{label} must be a number")
    }

    pub fn min(label: &str, bound: f64) -> String {
        format!("{label} must be at least {bound}")
    }

    pub fn max(label: &str, bound: f64) -> String {
        format!("{label} must be at most {bound}")
    }

    pub fn invalid_option(label: &str) -> String {
        format!("{label} must be one of the listed options")
    }
}
