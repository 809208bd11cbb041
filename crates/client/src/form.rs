//! Draft lifecycle for the task and profile forms.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use taskdeck_core::api::ApiResult;
use taskdeck_core::draft::Draft;
use taskdeck_core::validation::{Field as _, FieldErrors};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode<K> {
    Create,
    Edit(K),
}

impl<K> FormMode<K> {
    pub fn label(&self) -> &'static str {
        match self {
            FormMode::Create => "create",
            FormMode::Edit(_) => "update",
        }
    }
}

/// Validated request ready to be sent; the form is marked as submitting.
#[derive(Debug, Clone)]
pub struct Submission<D: Draft> {
    pub mode: FormMode<D::Key>,
    pub input: D::Input,
}

#[derive(Debug, Clone)]
pub enum SubmitGate<D: Draft> {
    /// No draft is open.
    Closed,
    /// A previous submission has not finished yet.
    InFlight,
    /// Validation failed; errors are stored on the form.
    Blocked,
    Proceed(Submission<D>),
}

pub struct FormController<D: Draft> {
    mode: Option<FormMode<D::Key>>,
    draft: D,
    baseline: D,
    errors: FieldErrors<D::Field>,
    dirty: bool,
    submitting: bool,
    submit_error: Option<String>,
    succeeded_at: Option<Instant>,
    success_window: Duration,
}

impl<D: Draft + fmt::Debug> fmt::Debug for FormController<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormController")
            .field("mode", &self.mode)
            .field("draft", &self.draft)
            .field("errors", &self.errors)
            .field("dirty", &self.dirty)
            .field("submitting", &self.submitting)
            .field("submit_error", &self.submit_error)
            .finish()
    }
}

impl<D: Draft> Default for FormController<D> {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}

impl<D: Draft> FormController<D> {
    pub fn new(success_window: Duration) -> Self {
        Self {
            mode: None,
            draft: D::default(),
            baseline: D::default(),
            errors: FieldErrors::new(),
            dirty: false,
            submitting: false,
            submit_error: None,
            succeeded_at: None,
            success_window,
        }
    }

    pub fn start_create(&mut self) {
        self.open(FormMode::Create, D::default());
    }

    pub fn start_edit(&mut self, source: &D::Source) {
        self.open(FormMode::Edit(D::key_of(source)), D::from_source(source));
    }

    fn open(&mut self, mode: FormMode<D::Key>, draft: D) {
        if self.submitting {
            tracing::debug!("form busy; ignoring request to open a new draft");
            return;
        }
        self.mode = Some(mode);
        self.baseline = draft.clone();
        self.draft = draft;
        self.errors.clear();
        self.dirty = false;
        self.submit_error = None;
    }

    /// Record an edit. Only the edited field's error is cleared; nothing is re-validated.
    pub fn set_field(&mut self, field: D::Field, value: String) {
        if self.mode.is_none() {
            tracing::debug!(field = field.label(), "edit ignored; no draft open");
            return;
        }
        self.draft.set(field, value);
        self.errors.remove(field);
        self.dirty = true;
        self.succeeded_at = None;
        self.submit_error = None;
    }

    pub fn begin_submit(&mut self) -> SubmitGate<D> {
        let Some(mode) = self.mode.clone() else {
            return SubmitGate::Closed;
        };
        if self.submitting {
            return SubmitGate::InFlight;
        }

        let errors = self.draft.validate();
        if !errors.is_empty() {
            tracing::debug!(count = errors.len(), "submission blocked by validation");
            self.errors = errors;
            return SubmitGate::Blocked;
        }

        self.errors.clear();
        self.submit_error = None;
        self.submitting = true;
        SubmitGate::Proceed(Submission {
            mode,
            input: self.draft.to_input(),
        })
    }

    /// Settle the in-flight submission. Success closes the draft and raises the success
    /// signal; failure keeps the draft for a retry and records a user-facing message.
    pub fn finish_submit<T>(&mut self, result: &ApiResult<T>) {
        self.submitting = false;
        match result {
            Ok(_) => {
                self.mode = None;
                self.draft = D::default();
                self.baseline = D::default();
                self.errors.clear();
                self.dirty = false;
                self.submit_error = None;
                self.succeeded_at = Some(Instant::now());
            }
            Err(err) => {
                self.submit_error = Some(err.user_message(D::SAVE_FAILED));
            }
        }
    }

    /// Validate, send through `send`, and settle. Returns `None` when nothing was sent.
    pub async fn submit<T, F, Fut>(&mut self, send: F) -> Option<ApiResult<T>>
    where
        F: FnOnce(Submission<D>) -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let SubmitGate::Proceed(submission) = self.begin_submit() else {
            return None;
        };
        let result = send(submission).await;
        self.finish_submit(&result);
        Some(result)
    }

    pub fn cancel(&mut self) {
        self.mode = None;
        self.draft = D::default();
        self.baseline = D::default();
        self.errors.clear();
        self.dirty = false;
        self.submit_error = None;
    }

    /// Restore the values the draft was opened with.
    pub fn reset(&mut self) {
        if self.mode.is_none() {
            return;
        }
        self.draft = self.baseline.clone();
        self.errors.clear();
        self.dirty = false;
        self.submit_error = None;
    }

    /// Drop the success signal once its window has passed. Returns whether it was cleared.
    pub fn prune(&mut self) -> bool {
        match self.succeeded_at {
            Some(at) if at.elapsed() >= self.success_window => {
                self.succeeded_at = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.mode.is_some()
    }

    pub fn mode(&self) -> Option<&FormMode<D::Key>> {
        self.mode.as_ref()
    }

    pub fn draft(&self) -> &D {
        &self.draft
    }

    pub fn value(&self, field: D::Field) -> &str {
        self.draft.get(field)
    }

    pub fn errors(&self) -> &FieldErrors<D::Field> {
        &self.errors
    }

    pub fn error_message(&self, field: D::Field) -> Option<String> {
        self.errors.message(field)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    pub fn success_visible(&self) -> bool {
        self.succeeded_at
            .map(|at| at.elapsed() < self.success_window)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use taskdeck_core::api::ApiError;
    use taskdeck_core::draft::{ProfileDraft, ProfileField, TaskDraft, TaskField};
    use taskdeck_core::model::{Priority, Profile, Task, TaskId, TaskStatus};
    use taskdeck_core::validation::FieldError;

    fn profile() -> Profile {
        Profile {
            email: "sam@example.com".into(),
            name: "Sam".into(),
            bio: "Gardener".into(),
            avatar: String::new(),
        }
    }

    #[test]
    fn blocked_submit_stores_errors_and_stays_idle() {
        let mut form = FormController::<TaskDraft>::default();
        form.start_create();

        assert!(matches!(form.begin_submit(), SubmitGate::Blocked));
        assert!(!form.is_submitting());
        assert_eq!(
            form.error_message(TaskField::Title).as_deref(),
            Some("Title is required")
        );
    }

    #[test]
    fn editing_a_field_clears_only_its_error() {
        let mut form = FormController::<ProfileDraft>::default();
        form.start_edit(&profile());
        form.set_field(ProfileField::Name, String::new());
        form.set_field(ProfileField::Avatar, "nope".into());
        assert!(matches!(form.begin_submit(), SubmitGate::Blocked));
        assert_eq!(form.errors().len(), 2);

        form.set_field(ProfileField::Name, "J".into());
        assert_eq!(form.errors().get(ProfileField::Name), None);
        assert_eq!(
            form.errors().get(ProfileField::Avatar),
            Some(FieldError::InvalidUrl)
        );
    }

    #[test]
    fn second_submit_while_in_flight_is_ignored() {
        let mut form = FormController::<TaskDraft>::default();
        form.start_create();
        form.set_field(TaskField::Title, "Water plants".into());

        let SubmitGate::Proceed(submission) = form.begin_submit() else {
            panic!("expected submission");
        };
        assert_eq!(submission.mode, FormMode::Create);
        assert_eq!(submission.input.title, "Water plants");
        assert!(matches!(form.begin_submit(), SubmitGate::InFlight));
    }

    #[test]
    fn failure_keeps_draft_with_server_or_fallback_message() {
        let mut form = FormController::<TaskDraft>::default();
        form.start_create();
        form.set_field(TaskField::Title, "Water plants".into());

        assert!(matches!(form.begin_submit(), SubmitGate::Proceed(_)));
        form.finish_submit::<()>(&Err(ApiError::Timeout));
        assert_eq!(form.submit_error(), Some("Failed to save task"));
        assert_eq!(form.value(TaskField::Title), "Water plants");
        assert!(form.is_open());

        assert!(matches!(form.begin_submit(), SubmitGate::Proceed(_)));
        form.finish_submit::<()>(&Err(ApiError::rejected("Title too spicy")));
        assert_eq!(form.submit_error(), Some("Title too spicy"));
    }

    #[test]
    fn success_closes_draft_and_raises_signal() {
        let mut form = FormController::<TaskDraft>::new(Duration::from_secs(60));
        let task = Task {
            id: TaskId::new("t-9"),
            title: "Call plumber".into(),
            description: None,
            status: TaskStatus::Pending,
            priority: Priority::High,
            due_date: None,
            created_at: Utc::now(),
        };
        form.start_edit(&task);
        form.set_field(TaskField::Title, "Call the plumber".into());

        let SubmitGate::Proceed(submission) = form.begin_submit() else {
            panic!("expected submission");
        };
        assert_eq!(submission.mode, FormMode::Edit(TaskId::new("t-9")));
        form.finish_submit(&Ok(()));

        assert!(!form.is_open());
        assert!(!form.is_dirty());
        assert!(form.success_visible());
        assert!(!form.prune());
    }

    #[test]
    fn success_signal_expires() {
        let mut form = FormController::<TaskDraft>::new(Duration::ZERO);
        form.start_create();
        form.set_field(TaskField::Title, "Stretch".into());
        assert!(matches!(form.begin_submit(), SubmitGate::Proceed(_)));
        form.finish_submit(&Ok(()));

        assert!(!form.success_visible());
        assert!(form.prune());
    }

    #[tokio::test]
    async fn submit_sends_once_and_settles() {
        let mut form = FormController::<ProfileDraft>::default();
        form.start_edit(&profile());
        form.set_field(ProfileField::Name, "Sam Carter".into());

        let mut sent = Vec::new();
        let result = form
            .submit(|submission| {
                sent.push(submission.input.name.clone());
                async { Ok::<_, ApiError>(()) }
            })
            .await;
        assert_eq!(result, Some(Ok(())));
        assert_eq!(sent, vec!["Sam Carter".to_string()]);
        assert!(form.success_visible());

        let skipped = form
            .submit(|_| async { Ok::<_, ApiError>(()) })
            .await;
        assert_eq!(skipped, None);
    }

    #[test]
    fn reset_restores_seeded_values() {
        let mut form = FormController::<ProfileDraft>::default();
        form.start_edit(&profile());
        form.set_field(ProfileField::Bio, "Beekeeper".into());
        assert!(form.is_dirty());

        form.reset();
        assert_eq!(form.value(ProfileField::Bio), "Gardener");
        assert!(!form.is_dirty());
    }

    #[test]
    fn closed_form_ignores_edits_and_submits() {
        let mut form = FormController::<TaskDraft>::default();
        form.set_field(TaskField::Title, "Ghost".into());
        assert_eq!(form.value(TaskField::Title), "");
        assert!(matches!(form.begin_submit(), SubmitGate::Closed));

        form.start_create();
        form.set_field(TaskField::Title, "Real".into());
        form.cancel();
        assert!(!form.is_open());
        assert_eq!(form.value(TaskField::Title), "");
    }
}
