//! SQLite-backed implementation of [`TaskApi`] for running the client without a server.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::api::{ApiError, ApiResult, ProfileEnvelope, TaskApi, TaskEnvelope, TaskList};
use crate::config::AppConfig;
use crate::database::Database;
use crate::draft::{ProfileDraft, TaskField};
use crate::model::{Filter, Profile, ProfileInput, TaskId, TaskInput};
use crate::validation::{self, Field as _, Validate};

const NOT_FOUND: &str = "Task not found";
const SERVER_ERROR: &str = "Server error";

/// One connection, opened and migrated once, shared by every call.
#[derive(Clone)]
pub struct LocalApi {
    config: AppConfig,
    db: Arc<Mutex<Database>>,
}

impl fmt::Debug for LocalApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalApi")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LocalApi {
    pub fn new(config: AppConfig) -> Result<Self> {
        let db = Database::initialize(&config)?;
        Ok(Self {
            config,
            db: Arc::new(Mutex::new(db)),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Profile of the signed-in user, created on first access.
    pub fn current_user(&self) -> Result<Profile> {
        self.db.lock().load_profile(self.config.user_email())
    }

    async fn with_database<T, F>(&self, f: F) -> ApiResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database, &AppConfig) -> ApiResult<T> + Send + 'static,
    {
        let config = self.config.clone();
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let db = db.lock();
            f(&db, &config)
        })
        .await
        .map_err(|err| ApiError::Unreachable(format!("blocking task failed: {}", err)))?
    }
}

fn storage_error(err: anyhow::Error) -> ApiError {
    tracing::error!(error = %format!("{err:#}"), "local store failure");
    ApiError::Rejected {
        status: Some(500),
        message: Some(SERVER_ERROR.to_string()),
    }
}

fn bad_request(message: String) -> ApiError {
    ApiError::Rejected {
        status: Some(400),
        message: Some(message),
    }
}

fn not_found() -> ApiError {
    ApiError::Rejected {
        status: Some(404),
        message: Some(NOT_FOUND.to_string()),
    }
}

fn check_task(input: &TaskInput) -> ApiResult<()> {
    validation::required(&input.title)
        .map_err(|err| bad_request(err.message(TaskField::Title.label())))
}

/// Same rules as the profile form; the first failing field is reported.
fn check_profile(input: &ProfileInput) -> ApiResult<()> {
    let draft = ProfileDraft {
        name: input.name.clone(),
        bio: input.bio.clone(),
        avatar: input.avatar.clone(),
    };
    match draft.validate().messages().into_iter().next() {
        Some((_, message)) => Err(bad_request(message)),
        None => Ok(()),
    }
}

#[async_trait]
impl TaskApi for LocalApi {
    async fn list_tasks(&self, filter: &Filter) -> ApiResult<TaskList> {
        let filter = filter.clone();
        self.with_database(move |db, _| {
            let tasks = db.fetch_tasks(&filter).map_err(storage_error)?;
            Ok(TaskList { tasks })
        })
        .await
    }

    async fn create_task(&self, input: &TaskInput) -> ApiResult<TaskEnvelope> {
        check_task(input)?;
        let input = input.clone();
        self.with_database(move |db, _| {
            let task = db.insert_task(&input).map_err(storage_error)?;
            tracing::debug!(task_id = %task.id, "local store created task");
            Ok(TaskEnvelope { task })
        })
        .await
    }

    async fn update_task(&self, id: &TaskId, input: &TaskInput) -> ApiResult<TaskEnvelope> {
        check_task(input)?;
        let id = id.clone();
        let input = input.clone();
        self.with_database(move |db, _| {
            let task = db
                .update_task(&id, &input)
                .map_err(storage_error)?
                .ok_or_else(not_found)?;
            Ok(TaskEnvelope { task })
        })
        .await
    }

    async fn delete_task(&self, id: &TaskId) -> ApiResult<()> {
        let id = id.clone();
        self.with_database(move |db, _| {
            if db.delete_task(&id).map_err(storage_error)? {
                Ok(())
            } else {
                Err(not_found())
            }
        })
        .await
    }

    async fn update_profile(&self, input: &ProfileInput) -> ApiResult<ProfileEnvelope> {
        check_profile(input)?;
        let input = input.clone();
        self.with_database(move |db, config| {
            let user = db
                .save_profile(config.user_email(), &input)
                .map_err(storage_error)?;
            Ok(ProfileEnvelope { user })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, TaskStatus};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn api_with_temp_dir() -> (LocalApi, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::from_data_dir(temp_dir.path().to_path_buf())
            .unwrap()
            .with_user_email("sam@example.com");
        let api = LocalApi::new(config).unwrap();
        (api, temp_dir)
    }

    fn input(title: &str) -> TaskInput {
        TaskInput {
            title: title.into(),
            priority: Priority::High,
            ..TaskInput::default()
        }
    }

    #[tokio::test]
    async fn create_then_list_with_filter() {
        let (api, _guard) = api_with_temp_dir();
        let created = api.create_task(&input("Book flights")).await.unwrap().task;
        api.create_task(&TaskInput {
            status: TaskStatus::Completed,
            ..input("Renew passport")
        })
        .await
        .unwrap();

        let pending = api
            .list_tasks(&Filter {
                status: Some(TaskStatus::Pending),
                ..Filter::default()
            })
            .await
            .unwrap();
        assert_eq!(pending.tasks, vec![created]);
    }

    #[tokio::test]
    async fn rejects_blank_title_with_message() {
        let (api, _guard) = api_with_temp_dir();
        let err = api.create_task(&input("  ")).await.unwrap_err();
        assert_eq!(err.message(), Some("Title is required"));
    }

    #[tokio::test]
    async fn update_and_delete_unknown_id_are_not_found() {
        let (api, _guard) = api_with_temp_dir();
        let missing = TaskId::new("nope");

        let update = api.update_task(&missing, &input("x")).await.unwrap_err();
        assert_eq!(update.message(), Some("Task not found"));

        let delete = api.delete_task(&missing).await.unwrap_err();
        assert_eq!(delete.message(), Some("Task not found"));
    }

    #[tokio::test]
    async fn profile_update_keeps_email() {
        let (api, _guard) = api_with_temp_dir();
        assert_eq!(api.current_user().unwrap().name, "sam");

        let user = api
            .update_profile(&ProfileInput {
                name: "Sam Carter".into(),
                bio: String::new(),
                avatar: String::new(),
            })
            .await
            .unwrap()
            .user;
        assert_eq!(user.email, "sam@example.com");
        assert_eq!(user.name, "Sam Carter");

        let short = api
            .update_profile(&ProfileInput {
                name: "S".into(),
                bio: String::new(),
                avatar: String::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(short.message(), Some("Name must be at least 2 characters"));
    }

    #[tokio::test]
    async fn rejects_invalid_avatar_url() {
        let (api, _guard) = api_with_temp_dir();
        let err = api
            .update_profile(&ProfileInput {
                name: "Sam".into(),
                bio: String::new(),
                avatar: "not-a-url".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.message(), Some("Please enter a valid URL"));
        assert_eq!(api.current_user().unwrap().avatar, "");
    }

    #[tokio::test]
    async fn clones_share_one_connection() {
        let (api, _guard) = api_with_temp_dir();
        let other = api.clone();
        assert!(Arc::ptr_eq(&api.db, &other.db));

        let created = other.create_task(&input("Water plants")).await.unwrap().task;
        let listed = api.list_tasks(&Filter::default()).await.unwrap();
        assert_eq!(listed.tasks, vec![created]);
    }
}
