//! In-memory `TaskApi` for exercising the engine without a backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use taskdeck_core::api::{ApiError, ApiResult, ProfileEnvelope, TaskApi, TaskEnvelope, TaskList};
use taskdeck_core::model::{Filter, Profile, ProfileInput, Task, TaskId, TaskInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Op {
    List,
    Create,
    Update,
    Delete,
    Profile,
}

#[derive(Default)]
struct Inner {
    tasks: Vec<Task>,
    profile: Profile,
    calls: HashMap<Op, usize>,
    failures: HashMap<Op, ApiError>,
    next_id: u32,
}

#[derive(Default)]
pub(crate) struct ScriptedApi {
    inner: Mutex<Inner>,
}

pub(crate) fn task(id: &str, title: &str) -> Task {
    Task {
        id: TaskId::new(id),
        title: title.into(),
        description: None,
        status: Default::default(),
        priority: Default::default(),
        due_date: None,
        created_at: Utc.with_ymd_and_hms(2025, 1, 5, 12, 0, 0).unwrap(),
    }
}

pub(crate) fn profile() -> Profile {
    Profile {
        email: "sam@example.com".into(),
        name: "Sam".into(),
        bio: String::new(),
        avatar: String::new(),
    }
}

impl ScriptedApi {
    pub(crate) fn new() -> Self {
        Self::with_tasks(Vec::new())
    }

    pub(crate) fn with_tasks(tasks: Vec<Task>) -> Self {
        let api = Self::default();
        {
            let mut inner = api.inner.lock();
            inner.tasks = tasks;
            inner.profile = profile();
        }
        api
    }

    /// Make every later call of `op` fail with `error`.
    pub(crate) fn fail(&self, op: Op, error: ApiError) {
        self.inner.lock().failures.insert(op, error);
    }

    pub(crate) fn recover(&self, op: Op) {
        self.inner.lock().failures.remove(&op);
    }

    pub(crate) fn calls(&self, op: Op) -> usize {
        self.inner.lock().calls.get(&op).copied().unwrap_or(0)
    }

    fn enter(&self, op: Op) -> ApiResult<parking_lot::MutexGuard<'_, Inner>> {
        let mut inner = self.inner.lock();
        *inner.calls.entry(op).or_default() += 1;
        if let Some(err) = inner.failures.get(&op).cloned() {
            return Err(err);
        }
        Ok(inner)
    }
}

fn matches(task: &Task, filter: &Filter) -> bool {
    let search = filter.search.to_lowercase();
    (search.is_empty() || task.title.to_lowercase().contains(&search))
        && filter.status.map_or(true, |status| task.status == status)
        && filter.priority.map_or(true, |priority| task.priority == priority)
}

#[async_trait]
impl TaskApi for ScriptedApi {
    async fn list_tasks(&self, filter: &Filter) -> ApiResult<TaskList> {
        let inner = self.enter(Op::List)?;
        let tasks = inner
            .tasks
            .iter()
            .filter(|task| matches(task, filter))
            .cloned()
            .collect();
        Ok(TaskList { tasks })
    }

    async fn create_task(&self, input: &TaskInput) -> ApiResult<TaskEnvelope> {
        let mut inner = self.enter(Op::Create)?;
        inner.next_id += 1;
        let created = Task {
            id: TaskId::new(format!("new-{}", inner.next_id)),
            title: input.title.clone(),
            description: input.description.clone(),
            status: input.status,
            priority: input.priority,
            due_date: input.due_date,
            created_at: Utc::now(),
        };
        inner.tasks.insert(0, created.clone());
        Ok(TaskEnvelope { task: created })
    }

    async fn update_task(&self, id: &TaskId, input: &TaskInput) -> ApiResult<TaskEnvelope> {
        let mut inner = self.enter(Op::Update)?;
        let slot = inner
            .tasks
            .iter_mut()
            .find(|task| &task.id == id)
            .ok_or_else(|| ApiError::rejected("Task not found"))?;
        slot.title = input.title.clone();
        slot.description = input.description.clone();
        slot.status = input.status;
        slot.priority = input.priority;
        slot.due_date = input.due_date;
        Ok(TaskEnvelope { task: slot.clone() })
    }

    async fn delete_task(&self, id: &TaskId) -> ApiResult<()> {
        let mut inner = self.enter(Op::Delete)?;
        inner.tasks.retain(|task| &task.id != id);
        Ok(())
    }

    async fn update_profile(&self, input: &ProfileInput) -> ApiResult<ProfileEnvelope> {
        let mut inner = self.enter(Op::Profile)?;
        inner.profile.name = input.name.clone();
        inner.profile.bio = input.bio.clone();
        inner.profile.avatar = input.avatar.clone();
        Ok(ProfileEnvelope {
            user: inner.profile.clone(),
        })
    }
}
