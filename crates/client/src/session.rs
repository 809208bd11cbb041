//! Update loop translating user intents and API responses into state changes.

use taskdeck_core::api::{ApiResult, TaskApi, TaskList};
use taskdeck_core::draft::{ProfileDraft, ProfileField, TaskDraft, TaskField};
use taskdeck_core::model::{FilterPatch, Profile, Task, TaskId};

use crate::filter::FilterController;
use crate::form::{FormController, FormMode, SubmitGate, Submission};
use crate::options::SessionOptions;
use crate::projection::{self, ListProjection};
use crate::state::Notice;
use crate::store::{FetchOutcome, FetchRequest, TaskStore};
use crate::telemetry::{self, Event as TelemetryEvent};

const DELETE_FAILED: &str = "Failed to delete task";

#[derive(Debug, Clone)]
pub enum Message {
    FilterChanged(FilterPatch),
    FilterCleared,
    Refresh,
    TasksLoaded(u64, ApiResult<TaskList>),
    StartCreate,
    StartEdit(TaskId),
    CancelForm,
    TaskFieldChanged(TaskField, String),
    SubmitTaskForm,
    TaskSaved(FormMode<TaskId>, ApiResult<Task>),
    DeleteRequested(TaskId),
    DeleteConfirmed,
    DeleteCancelled,
    TaskDeleted(TaskId, ApiResult<()>),
    ProfileFieldChanged(ProfileField, String),
    ResetProfile,
    SubmitProfile,
    ProfileSaved(ApiResult<Profile>),
    Tick,
}

/// Remote work requested by [`Session::react`]; performing it yields the follow-up message.
#[derive(Debug, Clone)]
pub enum Command {
    Fetch(FetchRequest),
    SaveTask(Submission<TaskDraft>),
    DeleteTask(TaskId),
    SaveProfile(Submission<ProfileDraft>),
}

impl Command {
    pub async fn perform(self, api: &dyn TaskApi) -> Message {
        match self {
            Command::Fetch(request) => {
                let result = api.list_tasks(&request.filter).await;
                Message::TasksLoaded(request.token, result)
            }
            Command::SaveTask(Submission { mode, input }) => {
                let result = match &mode {
                    FormMode::Create => api.create_task(&input).await,
                    FormMode::Edit(id) => api.update_task(id, &input).await,
                };
                Message::TaskSaved(mode, result.map(|envelope| envelope.task))
            }
            Command::DeleteTask(id) => {
                let result = api.delete_task(&id).await;
                Message::TaskDeleted(id, result)
            }
            Command::SaveProfile(Submission { input, .. }) => {
                let result = api.update_profile(&input).await;
                Message::ProfileSaved(result.map(|envelope| envelope.user))
            }
        }
    }
}

pub struct Session {
    profile: Profile,
    store: TaskStore,
    filter: FilterController,
    task_form: FormController<TaskDraft>,
    profile_form: FormController<ProfileDraft>,
    pending_delete: Option<TaskId>,
    notice: Option<Notice>,
    options: SessionOptions,
    telemetry: telemetry::Handle,
}

impl Session {
    /// Open a session for an authenticated user. The returned command loads the task list.
    pub fn start(user: Profile, options: SessionOptions) -> (Self, Command) {
        let mut profile_form = FormController::new(options.success_window);
        profile_form.start_edit(&user);

        let mut session = Self {
            profile: user,
            store: TaskStore::new(),
            filter: FilterController::new(),
            task_form: FormController::new(options.success_window),
            profile_form,
            pending_delete: None,
            notice: None,
            options,
            telemetry: telemetry::Handle::new(),
        };
        session
            .telemetry
            .record(TelemetryEvent::SessionStarted(session.profile.email.clone()));
        tracing::info!(user = %session.profile.email, "session started");

        let command = session.fetch_current();
        (session, command)
    }

    /// Tear the session down, handing back the last known profile.
    pub fn end(self) -> Profile {
        self.telemetry.record(TelemetryEvent::SessionEnded);
        tracing::info!(user = %self.profile.email, "session ended");
        self.profile
    }

    /// Feed `message` through the update loop, performing each resulting command until idle.
    pub async fn dispatch(&mut self, api: &dyn TaskApi, message: Message) {
        let mut next = Some(message);
        while let Some(message) = next.take() {
            if let Some(command) = self.react(message) {
                next = Some(command.perform(api).await);
            }
        }
    }

    /// Perform `command` and dispatch its outcome.
    pub async fn run(&mut self, api: &dyn TaskApi, command: Command) {
        let message = command.perform(api).await;
        self.dispatch(api, message).await;
    }

    pub fn react(&mut self, message: Message) -> Option<Command> {
        self.prune();
        match message {
            Message::FilterChanged(patch) => {
                let filter = self.filter.set_filter(patch)?;
                self.telemetry
                    .record(TelemetryEvent::FilterChanged(filter.summary()));
                Some(self.fetch_current())
            }
            Message::FilterCleared => {
                self.filter.clear()?;
                self.telemetry.record(TelemetryEvent::FilterChanged(None));
                Some(self.fetch_current())
            }
            Message::Refresh => Some(self.fetch_current()),
            Message::TasksLoaded(token, result) => {
                self.handle_tasks_loaded(token, result);
                None
            }
            Message::StartCreate => {
                self.task_form.start_create();
                None
            }
            Message::StartEdit(id) => {
                match self.store.get(&id) {
                    Some(task) => self.task_form.start_edit(task),
                    None => tracing::debug!(task_id = %id, "edit requested for unknown task"),
                }
                None
            }
            Message::CancelForm => {
                self.task_form.cancel();
                None
            }
            Message::TaskFieldChanged(field, value) => {
                self.task_form.set_field(field, value);
                None
            }
            Message::SubmitTaskForm => self.submit_task(),
            Message::TaskSaved(mode, result) => {
                self.finish_task_save(mode, result);
                None
            }
            Message::DeleteRequested(id) => {
                if self.store.get(&id).is_some() {
                    self.pending_delete = Some(id);
                } else {
                    tracing::debug!(task_id = %id, "delete requested for unknown task");
                }
                None
            }
            Message::DeleteConfirmed => self.pending_delete.take().map(Command::DeleteTask),
            Message::DeleteCancelled => {
                self.pending_delete = None;
                None
            }
            Message::TaskDeleted(id, result) => {
                self.finish_delete(id, result);
                None
            }
            Message::ProfileFieldChanged(field, value) => {
                self.profile_form.set_field(field, value);
                None
            }
            Message::ResetProfile => {
                self.profile_form.reset();
                None
            }
            Message::SubmitProfile => self.submit_profile(),
            Message::ProfileSaved(result) => {
                self.finish_profile_save(result);
                None
            }
            Message::Tick => None,
        }
    }

    fn prune(&mut self) {
        if let Some(notice) = &self.notice {
            if notice.is_expired(self.options.notice_window) {
                self.notice = None;
            }
        }
        self.task_form.prune();
        self.profile_form.prune();
    }

    fn fetch_current(&mut self) -> Command {
        let request = self.store.begin_fetch(self.filter.filter().clone());
        self.telemetry
            .record(TelemetryEvent::FetchRequested(request.token));
        Command::Fetch(request)
    }

    fn handle_tasks_loaded(&mut self, token: u64, result: ApiResult<TaskList>) {
        match self.store.apply_fetch(token, result) {
            FetchOutcome::Applied(count) => self
                .telemetry
                .record(TelemetryEvent::FetchApplied { token, count }),
            FetchOutcome::Stale(stale) => self.telemetry.record(TelemetryEvent::FetchDiscarded {
                token: stale.token,
                latest: stale.latest,
            }),
            FetchOutcome::Failed(err) => self.telemetry.record(TelemetryEvent::FetchFailed {
                token,
                error: err.to_string(),
            }),
        }
    }

    fn submit_task(&mut self) -> Option<Command> {
        match self.task_form.begin_submit() {
            SubmitGate::Proceed(submission) => {
                self.telemetry.record(TelemetryEvent::SubmitStarted("task"));
                Some(Command::SaveTask(submission))
            }
            SubmitGate::InFlight => {
                tracing::debug!("task submission already in flight");
                None
            }
            SubmitGate::Blocked | SubmitGate::Closed => None,
        }
    }

    fn finish_task_save(&mut self, mode: FormMode<TaskId>, result: ApiResult<Task>) {
        self.task_form.finish_submit(&result);
        let action = mode.label();
        match result {
            Ok(task) => {
                tracing::info!(task_id = %task.id, action, "task saved");
                let message = match mode {
                    FormMode::Create => format!("Added task '{}'", task.title),
                    FormMode::Edit(_) => format!("Updated task '{}'", task.title),
                };
                match mode {
                    FormMode::Create => self.store.apply_created(task),
                    FormMode::Edit(_) => {
                        self.store.apply_updated(task);
                    }
                }
                self.notice = Some(Notice::info(message));
                self.telemetry
                    .record(TelemetryEvent::MutationApplied(action.into()));
            }
            Err(err) => {
                tracing::warn!(action, error = %err, "failed to save task");
                self.telemetry.record(TelemetryEvent::MutationFailed {
                    action: action.into(),
                    error: err.to_string(),
                });
            }
        }
    }

    fn finish_delete(&mut self, id: TaskId, result: ApiResult<()>) {
        match result {
            Ok(()) => {
                self.store.apply_deleted(&id);
                tracing::info!(task_id = %id, "task deleted");
                self.telemetry
                    .record(TelemetryEvent::MutationApplied("delete".into()));
            }
            Err(err) => {
                tracing::warn!(task_id = %id, error = %err, "failed to delete task");
                self.notice = Some(Notice::error(DELETE_FAILED));
                self.telemetry.record(TelemetryEvent::MutationFailed {
                    action: "delete".into(),
                    error: err.to_string(),
                });
            }
        }
    }

    fn submit_profile(&mut self) -> Option<Command> {
        match self.profile_form.begin_submit() {
            SubmitGate::Proceed(submission) => {
                self.telemetry
                    .record(TelemetryEvent::SubmitStarted("profile"));
                Some(Command::SaveProfile(submission))
            }
            SubmitGate::InFlight => {
                tracing::debug!("profile submission already in flight");
                None
            }
            SubmitGate::Blocked | SubmitGate::Closed => None,
        }
    }

    fn finish_profile_save(&mut self, result: ApiResult<Profile>) {
        self.profile_form.finish_submit(&result);
        match result {
            Ok(profile) => {
                tracing::info!(user = %profile.email, "profile updated");
                self.profile = profile;
                self.profile_form.start_edit(&self.profile);
                self.telemetry
                    .record(TelemetryEvent::MutationApplied("update profile".into()));
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to update profile");
                self.telemetry.record(TelemetryEvent::MutationFailed {
                    action: "update profile".into(),
                    error: err.to_string(),
                });
            }
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn filter(&self) -> &FilterController {
        &self.filter
    }

    pub fn task_form(&self) -> &FormController<TaskDraft> {
        &self.task_form
    }

    pub fn profile_form(&self) -> &FormController<ProfileDraft> {
        &self.profile_form
    }

    /// Task awaiting the user's delete confirmation.
    pub fn pending_delete(&self) -> Option<&Task> {
        self.pending_delete
            .as_ref()
            .and_then(|id| self.store.get(id))
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn projection(&self) -> ListProjection {
        projection::project(self.store.tasks())
    }

    pub fn telemetry(&self) -> &telemetry::Handle {
        &self.telemetry
    }
}
