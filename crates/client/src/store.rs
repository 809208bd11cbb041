//! The client's copy of the current task list, kept in step with the remote API.

use std::time::Instant;

use taskdeck_core::api::{ApiError, ApiResult, TaskApi, TaskList};
use taskdeck_core::model::{Filter, Task, TaskId, TaskInput};

use crate::state::LoadState;

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this task?";

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

impl Confirm for bool {
    fn confirm(&self, _prompt: &str) -> bool {
        *self
    }
}

/// A fetch the caller should perform; `token` identifies it when the response arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub token: u64,
    pub filter: Filter,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("response for fetch #{token} arrived after fetch #{latest} was issued")]
pub struct StaleResponse {
    pub token: u64,
    pub latest: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied(usize),
    Stale(StaleResponse),
    Failed(ApiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Declined,
    Deleted,
}

#[derive(Debug, Clone)]
pub struct TaskStore {
    tasks: Vec<Task>,
    latest_token: u64,
    state: LoadState,
    last_refreshed: Option<Instant>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            latest_token: 0,
            state: LoadState::Idle,
            last_refreshed: None,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn load_state(&self) -> &LoadState {
        &self.state
    }

    pub fn last_refreshed(&self) -> Option<Instant> {
        self.last_refreshed
    }

    pub fn begin_fetch(&mut self, filter: Filter) -> FetchRequest {
        self.latest_token = self.latest_token.wrapping_add(1);
        self.state = LoadState::Loading;
        FetchRequest {
            token: self.latest_token,
            filter,
        }
    }

    /// Apply a fetch response. Only the most recently issued fetch may replace the list.
    pub fn apply_fetch(&mut self, token: u64, result: ApiResult<TaskList>) -> FetchOutcome {
        if token != self.latest_token {
            let stale = StaleResponse {
                token,
                latest: self.latest_token,
            };
            tracing::debug!(%stale, "discarding stale task list");
            return FetchOutcome::Stale(stale);
        }

        match result {
            Ok(list) => {
                let count = list.tasks.len();
                self.tasks = list.tasks;
                self.state = LoadState::Idle;
                self.last_refreshed = Some(Instant::now());
                tracing::debug!(token, count, "task list replaced");
                FetchOutcome::Applied(count)
            }
            Err(err) => {
                tracing::warn!(token, error = %err, "failed to fetch tasks; keeping previous list");
                self.state = LoadState::Error(err.to_string());
                FetchOutcome::Failed(err)
            }
        }
    }

    /// Insert a confirmed new task at the front. An id already present is replaced instead.
    pub fn apply_created(&mut self, task: Task) {
        if let Some(slot) = self.tasks.iter_mut().find(|existing| existing.id == task.id) {
            *slot = task;
            return;
        }
        self.tasks.insert(0, task);
    }

    /// Replace a task in place. Returns `false` when the id is not in the current view.
    pub fn apply_updated(&mut self, task: Task) -> bool {
        match self.tasks.iter_mut().find(|existing| existing.id == task.id) {
            Some(slot) => {
                *slot = task;
                true
            }
            None => {
                tracing::debug!(task_id = %task.id, "updated task not in current view");
                false
            }
        }
    }

    pub fn apply_deleted(&mut self, id: &TaskId) -> Option<Task> {
        let index = self.tasks.iter().position(|task| &task.id == id)?;
        Some(self.tasks.remove(index))
    }

    pub async fn fetch(&mut self, api: &dyn TaskApi, filter: Filter) -> FetchOutcome {
        let request = self.begin_fetch(filter);
        let result = api.list_tasks(&request.filter).await;
        self.apply_fetch(request.token, result)
    }

    pub async fn create(&mut self, api: &dyn TaskApi, input: &TaskInput) -> ApiResult<Task> {
        let task = api.create_task(input).await?.task;
        self.apply_created(task.clone());
        Ok(task)
    }

    pub async fn update(
        &mut self,
        api: &dyn TaskApi,
        id: &TaskId,
        input: &TaskInput,
    ) -> ApiResult<Task> {
        let task = api.update_task(id, input).await?.task;
        self.apply_updated(task.clone());
        Ok(task)
    }

    /// Delete after explicit confirmation. The entry stays when the remote call fails.
    pub async fn delete(
        &mut self,
        api: &dyn TaskApi,
        id: &TaskId,
        confirm: &dyn Confirm,
    ) -> ApiResult<DeleteOutcome> {
        if !confirm.confirm(DELETE_PROMPT) {
            return Ok(DeleteOutcome::Declined);
        }
        if let Err(err) = api.delete_task(id).await {
            tracing::warn!(task_id = %id, error = %err, "failed to delete task");
            return Err(err);
        }
        self.apply_deleted(id);
        Ok(DeleteOutcome::Deleted)
    }
}
