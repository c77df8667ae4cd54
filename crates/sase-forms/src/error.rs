//! Error types for the forms engine

use thiserror::Error;

/// Forms engine error type
///
/// Only construction problems and storage failures are errors. A value that
/// fails a compiled rule is reported through
/// [`ValidationOutcome`](crate::schema::ValidationOutcome) instead.
#[derive(Error, Debug)]
pub enum FormsError {
    /// A field's `validation.pattern` is not a valid regular expression
    #[error("invalid pattern for field '{field}': {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: Box<fancy_regex::Error>,
    },

    /// A field's `minDate`/`maxDate` bound is not a calendar date
    #[error("invalid date bound for field '{field}': {value}")]
    InvalidDateBound { field: String, value: String },

    /// Schema document could not be parsed
    #[error("invalid schema: {0}")]
    InvalidSchema(#[from] serde_json::Error),

    /// A form operation ran before any schema was loaded
    #[error("no form loaded")]
    NoActiveForm,

    /// Stored submission data is neither a mapping nor JSON text of one
    #[error("invalid submission data: {0}")]
    InvalidSubmissionData(String),

    /// Submission store failure
    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type for the forms engine
pub type Result<T> = std::result::Result<T, FormsError>;
