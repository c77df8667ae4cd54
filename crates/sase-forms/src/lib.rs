//! OpenSASE Forms Engine
//!
//! Schema-driven form validation and rendering: a JSON schema describes the
//! fields, the engine compiles it into per-field rules, decides which control
//! displays each field, and turns stored submissions back into readable
//! `label: value` lines.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ compile ┌──────────┐ validate ┌───────────────────┐
//! │  FormSchema  │────────►│ RuleSet  │─────────►│ ValidationOutcome │
//! └──────────────┘         └──────────┘          └───────────────────┘
//!        │                       │                         │
//!        │         FormSession (ArcSwap<ActiveForm>)       │
//!        ▼                                                 ▼
//! ┌──────────────┐  submit  ┌────────────────────┐  render ┌─────────────┐
//! │  FormState   │─────────►│SubmissionRepository│   ◄─────│ Controls    │
//! └──────────────┘          └────────────────────┘         └─────────────┘
//!                                     │ list
//!                                     ▼
//!                  SubmissionView (labels) / FormStatistics
//! ```

pub mod display;
pub mod error;
pub mod field;
pub mod labels;
pub mod render;
pub mod repository;
pub mod rule;
pub mod schema;
pub mod session;
pub mod stats;
pub mod submission;
pub mod value;

pub use display::DisplayText;
pub use error::{FormsError, Result};
pub use field::{DropdownOption, ErrorMessages, FieldDescriptor, FieldType, FieldValidation, FormSchema};
pub use labels::{resolve_label, resolve_value, FieldsMapping, LabelLookup};
pub use render::{render, ControlDescription, FieldState};
pub use repository::{InMemorySubmissionRepository, NewSubmission, SubmissionRepository, SubmissionResult};
pub use rule::{compile_field, Rule};
pub use schema::{compile, validate, RuleSet, ValidationOutcome};
pub use session::{ActiveForm, FormSession, FormState, PendingSubmission, SubmitOutcome};
pub use stats::{FormStat, FormStatistics};
pub use submission::{SubmissionRecord, SubmissionView};
pub use value::FormValues;
