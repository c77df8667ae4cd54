//! Form Session
//!
//! Holds the active schema together with its compiled rule set, and the
//! per-form interaction state that drives rendering and submission.
//!
//! ```text
//!   load_schema ──compile──► ActiveForm{generation, schema, rules}
//!                                 │ atomic store (ArcSwap)
//!                                 ▼
//!   render / validate ◄──── snapshot()   (always a complete pair)
//!
//!   submit: begin_submit ──valid──► repository ──► apply_result
//!                │invalid                              │ generation changed?
//!                ▼                                     ▼
//!           errors shown, nothing sent              discarded
//! ```

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{FormsError, Result};
use crate::field::{FieldDescriptor, FieldType, FormSchema};
use crate::labels::FieldsMapping;
use crate::render::{render, ControlDescription, FieldState};
use crate::repository::{NewSubmission, SubmissionRepository, SubmissionResult};
use crate::schema::{compile, RuleSet, ValidationOutcome};
use crate::value::{parse_number, FormValues, RawValue, NO_VALUE};

// =============================================================================
// Active Form
// =============================================================================

/// A schema and the rule set compiled from it, installed as one unit
#[derive(Debug)]
pub struct ActiveForm {
    generation: u64,
    schema: Arc<FormSchema>,
    rules: RuleSet,
}

impl ActiveForm {
    /// Increases by one with every installed schema
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn validate(&self, values: &FormValues) -> ValidationOutcome {
        self.rules.validate(values)
    }
}

/// Single-writer, multi-reader holder of the active form
pub struct FormSession {
    active: ArcSwapOption<ActiveForm>,
    /// Serializes installs; holds the last generation handed out
    install: Mutex<u64>,
}

impl FormSession {
    pub fn new() -> Self {
        Self {
            active: ArcSwapOption::empty(),
            install: Mutex::new(0),
        }
    }

    /// Current form, if a schema has been loaded
    pub fn snapshot(&self) -> Option<Arc<ActiveForm>> {
        self.active.load_full()
    }

    /// Compile and install a schema
    ///
    /// Compilation completes before the new pair is stored, so readers never
    /// observe a partial rule set. On a construction error the previous form
    /// stays active. Passing the schema that is already active is a no-op.
    pub fn load(&self, schema: Arc<FormSchema>) -> Result<Arc<ActiveForm>> {
        if let Some(current) = self.snapshot() {
            if Arc::ptr_eq(&current.schema, &schema) {
                return Ok(current);
            }
        }

        let rules = compile(&schema.fields)?;

        let mut last = self.install.lock();
        *last += 1;
        let form = Arc::new(ActiveForm {
            generation: *last,
            schema,
            rules,
        });
        self.active.store(Some(Arc::clone(&form)));
        debug!(generation = form.generation, title = %form.schema.title, "form installed");
        Ok(form)
    }

    /// Compile and install an owned schema
    pub fn load_schema(&self, schema: FormSchema) -> Result<Arc<ActiveForm>> {
        self.load(Arc::new(schema))
    }

    /// Validate locally, then hand the submission to `repository`
    ///
    /// Nothing is sent when local validation fails. A response that arrives
    /// after a different schema was installed is discarded.
    pub async fn submit(
        &self,
        state: &mut FormState,
        repository: &dyn SubmissionRepository,
    ) -> Result<SubmitOutcome> {
        let form = self.snapshot().ok_or(FormsError::NoActiveForm)?;
        state.rebind(&form);

        let pending = match state.begin_submit(&form) {
            Ok(pending) => pending,
            Err(outcome) => return Ok(SubmitOutcome::Invalid(outcome)),
        };

        let result = repository.submit(pending.submission.clone()).await?;

        match self.snapshot() {
            Some(current) => Ok(state.apply_result(&current, &pending, result)),
            None => Ok(SubmitOutcome::Discarded),
        }
    }
}

impl Default for FormSession {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Interaction State
// =============================================================================

/// A submission validated against one generation of the form
#[derive(Clone, Debug)]
pub struct PendingSubmission {
    pub generation: u64,
    pub submission: NewSubmission,
}

/// How a submit attempt ended
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome {
    /// Local validation failed; nothing was sent
    Invalid(ValidationOutcome),
    Accepted { message: String },
    /// Store refused; per-field messages are now overlaid on the form
    Rejected {
        message: String,
        errors: HashMap<String, String>,
    },
    /// Response belonged to a schema that is no longer active
    Discarded,
}

/// Values, touched flags and server errors of one form being filled in
///
/// Owned by the caller and passed explicitly to rendering.
#[derive(Clone, Debug, Default)]
pub struct FormState {
    generation: u64,
    values: FormValues,
    touched: HashSet<String>,
    server_errors: HashMap<String, String>,
}

impl FormState {
    /// Fresh state with every field empty
    pub fn new(form: &ActiveForm) -> Self {
        let mut state = Self::default();
        state.reset(form);
        state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Reset if bound to another generation; returns whether it did
    pub fn rebind(&mut self, form: &ActiveForm) -> bool {
        if self.generation == form.generation {
            return false;
        }
        self.reset(form);
        true
    }

    /// Clear values, touched flags and server errors
    pub fn reset(&mut self, form: &ActiveForm) {
        self.generation = form.generation;
        self.values = form
            .schema
            .fields
            .iter()
            .map(|f| (f.name.clone(), Value::String(NO_VALUE.to_string())))
            .collect();
        self.touched.clear();
        self.server_errors.clear();
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Local edit; supersedes any server error on the field
    pub fn set_value(&mut self, name: &str, value: impl Into<Value>) {
        self.values.insert(name.to_string(), value.into());
        self.server_errors.remove(name);
    }

    /// Mark a field as interacted with (blur)
    pub fn touch(&mut self, name: &str) {
        self.touched.insert(name.to_string());
    }

    pub fn is_touched(&self, name: &str) -> bool {
        self.touched.contains(name)
    }

    pub fn server_error(&self, name: &str) -> Option<&str> {
        self.server_errors.get(name).map(String::as_str)
    }

    pub fn local_errors(&self, form: &ActiveForm) -> ValidationOutcome {
        form.validate(&self.values)
    }

    /// Render input for one field given an already computed outcome
    pub fn field_state<'a>(
        &'a self,
        field: &'a FieldDescriptor,
        outcome: &'a ValidationOutcome,
    ) -> FieldState<'a> {
        FieldState {
            field,
            value: self.values.get(&field.name),
            touched: self.is_touched(&field.name),
            compiled_error: outcome.error(&field.name),
            server_error: self.server_error(&field.name),
        }
    }

    /// Controls for every renderable field, in display order
    pub fn render_all(&self, form: &ActiveForm) -> Vec<ControlDescription> {
        let outcome = self.local_errors(form);
        form.schema
            .fields
            .iter()
            .filter_map(|field| render(&self.field_state(field, &outcome)))
            .collect()
    }

    /// Touch every field and validate; on success, package the submission
    pub fn begin_submit(
        &mut self,
        form: &ActiveForm,
    ) -> std::result::Result<PendingSubmission, ValidationOutcome> {
        self.rebind(form);
        self.server_errors.clear();
        for field in &form.schema.fields {
            self.touched.insert(field.name.clone());
        }

        let outcome = self.local_errors(form);
        if !outcome.is_valid() {
            debug!(errors = outcome.errors().count(), "submit blocked by local validation");
            return Err(outcome);
        }

        let data = submission_payload(&form.schema, &self.values);
        Ok(PendingSubmission {
            generation: form.generation,
            submission: NewSubmission {
                form_title: form.schema.title.clone(),
                fields_mapping: FieldsMapping::capture(&form.schema, &data),
                data,
            },
        })
    }

    /// Merge the store's answer into the state
    pub fn apply_result(
        &mut self,
        form: &ActiveForm,
        pending: &PendingSubmission,
        result: SubmissionResult,
    ) -> SubmitOutcome {
        if pending.generation != form.generation || self.generation != form.generation {
            info!(
                submitted = pending.generation,
                active = form.generation,
                "discarding response for a replaced schema"
            );
            return SubmitOutcome::Discarded;
        }

        if result.success {
            self.reset(form);
            return SubmitOutcome::Accepted {
                message: result.message,
            };
        }

        let mut applied = HashMap::new();
        for (name, messages) in result.errors.unwrap_or_default() {
            if form.schema.field(&name).is_none() || messages.is_empty() {
                debug!(field = %name, "server error for unknown field dropped");
                continue;
            }
            let message = messages.join("; ");
            self.touched.insert(name.clone());
            self.server_errors.insert(name.clone(), message.clone());
            applied.insert(name, message);
        }

        SubmitOutcome::Rejected {
            message: result.message,
            errors: applied,
        }
    }
}

/// Values as sent: numeric text on number fields becomes a JSON number, the
/// empty sentinel stays an empty string
fn submission_payload(schema: &FormSchema, values: &FormValues) -> FormValues {
    let mut data = values.clone();
    for field in schema.fields.iter().filter(|f| f.field_type == FieldType::Number) {
        let parsed = data
            .get(&field.name)
            .and_then(|v| parse_number(RawValue::classify(Some(v))))
            .and_then(serde_json::Number::from_f64);
        if let Some(number) = parsed {
            let number = match number.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Value::from(f as i64),
                _ => Value::Number(number),
            };
            data.insert(field.name.clone(), number);
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldValidation;
    use crate::repository::InMemorySubmissionRepository;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn signup() -> FormSchema {
        FormSchema::new(
            "Signup",
            vec![
                FieldDescriptor::new("email", "Email", "email").required(),
                FieldDescriptor::new("age", "Age", "number").with_validation(FieldValidation {
                    min: Some(0.0),
                    ..Default::default()
                }),
            ],
        )
    }

    #[test]
    fn test_load_installs_new_generation() {
        let session = FormSession::new();
        assert!(session.snapshot().is_none());

        let first = session.load_schema(signup()).unwrap();
        let second = session.load_schema(signup()).unwrap();

        assert_eq!(first.generation(), 1);
        assert_eq!(second.generation(), 2);
        assert_eq!(session.snapshot().unwrap().generation(), 2);
    }

    #[test]
    fn test_same_schema_is_not_recompiled() {
        let session = FormSession::new();
        let schema = Arc::new(signup());

        let first = session.load(Arc::clone(&schema)).unwrap();
        let again = session.load(schema).unwrap();

        assert_eq!(first.generation(), again.generation());
    }

    #[test]
    fn test_failed_compile_keeps_previous_form() {
        let session = FormSession::new();
        session.load_schema(signup()).unwrap();

        let broken = FormSchema::from_json(
            r#"{"title": "Broken", "fields": [
                {"name": "x", "label": "X", "type": "text", "validation": {"pattern": "[unclosed"}}
            ]}"#,
        )
        .unwrap();
        assert!(session.load_schema(broken).is_err());

        let active = session.snapshot().unwrap();
        assert_eq!(active.schema().title, "Signup");
        assert_eq!(active.rules().len(), 2);
    }

    #[test]
    fn test_errors_hidden_until_touched() {
        let session = FormSession::new();
        let form = session.load_schema(signup()).unwrap();
        let mut state = FormState::new(&form);

        let controls = state.render_all(&form);
        assert!(controls.iter().all(|c| c.error().is_none()));

        state.touch("email");
        let controls = state.render_all(&form);
        assert_eq!(controls[0].error(), Some("Email is required"));
        assert_eq!(controls[1].error(), None);
    }

    #[test]
    fn test_server_error_is_one_shot() {
        let session = FormSession::new();
        let form = session.load_schema(signup()).unwrap();
        let mut state = FormState::new(&form);
        state.set_value("email", "taken@example.com");

        let pending = state.begin_submit(&form).unwrap();
        let mut errors = HashMap::new();
        errors.insert("email".to_string(), vec!["Email already registered".to_string()]);
        errors.insert("ghost".to_string(), vec!["No such field".to_string()]);
        let outcome = state.apply_result(&form, &pending, SubmissionResult::rejected("Invalid", errors));

        match outcome {
            SubmitOutcome::Rejected { errors, .. } => {
                assert_eq!(errors.len(), 1);
                assert!(errors.contains_key("email"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(state.render_all(&form)[0].error(), Some("Email already registered"));

        // a local edit supersedes the server message
        state.set_value("email", "");
        assert_eq!(state.render_all(&form)[0].error(), Some("Email is required"));
        assert_eq!(state.server_error("email"), None);
    }

    #[test]
    fn test_accepted_resets_state() {
        let session = FormSession::new();
        let form = session.load_schema(signup()).unwrap();
        let mut state = FormState::new(&form);
        state.set_value("email", "a@b.com");
        state.set_value("age", "42");

        let pending = state.begin_submit(&form).unwrap();
        assert_eq!(pending.submission.data["age"], json!(42));

        let outcome = state.apply_result(&form, &pending, SubmissionResult::accepted("ok"));
        assert_eq!(outcome, SubmitOutcome::Accepted { message: "ok".into() });
        assert_eq!(state.value("email"), Some(&json!("")));
        assert!(!state.is_touched("email"));
    }

    #[test]
    fn test_empty_number_is_sent_as_empty() {
        let session = FormSession::new();
        let form = session.load_schema(signup()).unwrap();
        let mut state = FormState::new(&form);
        state.set_value("email", "a@b.com");

        let pending = state.begin_submit(&form).unwrap();
        assert_eq!(pending.submission.data["age"], json!(""));
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let session = FormSession::new();
        let old = session.load_schema(signup()).unwrap();
        let mut state = FormState::new(&old);
        state.set_value("email", "a@b.com");
        let pending = state.begin_submit(&old).unwrap();

        let new = session.load_schema(signup()).unwrap();
        let mut errors = HashMap::new();
        errors.insert("email".to_string(), vec!["stale".to_string()]);
        let outcome = state.apply_result(&new, &pending, SubmissionResult::rejected("no", errors));

        assert_eq!(outcome, SubmitOutcome::Discarded);
        assert_eq!(state.server_error("email"), None);
    }

    /// Counts calls and replaces the active schema while "in flight"
    struct SwappingRepository {
        session: Arc<FormSession>,
        calls: AtomicUsize,
        swap: bool,
    }

    #[async_trait]
    impl SubmissionRepository for SwappingRepository {
        async fn submit(&self, _submission: NewSubmission) -> Result<SubmissionResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.swap {
                self.session.load_schema(signup())?;
            }
            let mut errors = HashMap::new();
            errors.insert("email".to_string(), vec!["Domain blocked".to_string(), "Try again".to_string()]);
            Ok(SubmissionResult::rejected("Invalid", errors))
        }

        async fn list(&self) -> Result<Vec<crate::submission::SubmissionRecord>> {
            Ok(Vec::new())
        }

        async fn delete_all(&self) -> Result<()> {
            Ok(())
        }
    }

    fn swapping(session: &Arc<FormSession>, swap: bool) -> SwappingRepository {
        SwappingRepository {
            session: Arc::clone(session),
            calls: AtomicUsize::new(0),
            swap,
        }
    }

    #[tokio::test]
    async fn test_invalid_form_is_not_sent() {
        let session = Arc::new(FormSession::new());
        let form = session.load_schema(signup()).unwrap();
        let repo = swapping(&session, false);
        let mut state = FormState::new(&form);
        state.set_value("email", "abc");

        let outcome = session.submit(&mut state, &repo).await.unwrap();

        match outcome {
            SubmitOutcome::Invalid(errors) => {
                assert_eq!(errors.error("email"), Some("Email must be a valid email address"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(repo.calls.load(Ordering::SeqCst), 0);
        assert!(state.is_touched("age"));
    }

    #[tokio::test]
    async fn test_server_messages_joined() {
        let session = Arc::new(FormSession::new());
        let form = session.load_schema(signup()).unwrap();
        let repo = swapping(&session, false);
        let mut state = FormState::new(&form);
        state.set_value("email", "a@b.com");

        session.submit(&mut state, &repo).await.unwrap();

        assert_eq!(repo.calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.server_error("email"), Some("Domain blocked; Try again"));
    }

    #[tokio::test]
    async fn test_schema_replaced_in_flight() {
        let session = Arc::new(FormSession::new());
        let form = session.load_schema(signup()).unwrap();
        let repo = swapping(&session, true);
        let mut state = FormState::new(&form);
        state.set_value("email", "a@b.com");

        let outcome = session.submit(&mut state, &repo).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Discarded);
        assert_eq!(state.server_error("email"), None);
        assert_eq!(session.snapshot().unwrap().generation(), 2);
    }

    #[tokio::test]
    async fn test_accepted_by_store() {
        let session = FormSession::new();
        let form = session.load_schema(signup()).unwrap();
        let repo = InMemorySubmissionRepository::new();
        let mut state = FormState::new(&form);
        state.set_value("email", "a@b.com");

        let outcome = session.submit(&mut state, &repo).await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::Accepted { .. }));
        let stored = repo.list().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].form_title, "Signup");
        assert_eq!(state.value("email"), Some(&json!("")));
    }

    #[tokio::test]
    async fn test_submit_without_schema() {
        let session = FormSession::new();
        let repo = InMemorySubmissionRepository::new();
        let mut state = FormState::default();

        let err = session.submit(&mut state, &repo).await.unwrap_err();
        assert!(matches!(err, FormsError::NoActiveForm));
    }
}
