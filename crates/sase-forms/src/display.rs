//! Display text used when presenting stored submissions

use serde::{Deserialize, Serialize};

/// Fixed strings for values that have no natural text form
///
/// Every field is optional when deserializing, so a config file only needs to
/// list what it overrides.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayText {
    /// Shown for null, absent and empty values
    pub not_entered: String,
    pub yes: String,
    pub no: String,
    /// Shown when a submission timestamp cannot be parsed
    pub missing_date: String,
    /// Title for a submission without one; `{n}` is the 1-based position
    pub untitled_submission: String,
}

impl Default for DisplayText {
    fn default() -> Self {
        Self {
            not_entered: "Not entered".into(),
            yes: "Yes".into(),
            no: "No".into(),
            missing_date: "---".into(),
            untitled_submission: "Submission #{n}".into(),
        }
    }
}

impl DisplayText {
    pub fn boolean(&self, value: bool) -> &str {
        if value {
            &self.yes
        } else {
            &self.no
        }
    }

    pub fn untitled(&self, position: usize) -> String {
        self.untitled_submission.replace("{n}", &position.to_string())
    }
}
