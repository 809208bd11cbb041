//! Contract the client engine requires from the remote task/profile API.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{Filter, Profile, ProfileInput, Task, TaskId, TaskInput};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// The remote API rejected an operation or could not complete it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{}", .message.as_deref().unwrap_or("request was rejected"))]
    Rejected {
        status: Option<u16>,
        message: Option<String>,
    },
    #[error("remote API unreachable: {0}")]
    Unreachable(String),
    #[error("remote API timed out")]
    Timeout,
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl ApiError {
    pub fn rejected(message: impl Into<String>) -> Self {
        ApiError::Rejected {
            status: None,
            message: Some(message.into()),
        }
    }

    /// Build a rejection from a failure response body, keeping its `message` if present.
    pub fn from_body(status: Option<u16>, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .unwrap_or_default()
            .message
            .filter(|message| !message.trim().is_empty());
        ApiError::Rejected { status, message }
    }

    /// Server-provided message, if the failure carried one.
    pub fn message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn user_message(&self, fallback: &str) -> String {
        self.message().unwrap_or(fallback).to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub task: Task,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEnvelope {
    pub user: Profile,
}

/// Remote task/profile operations. Callers are already authenticated.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// `GET tasks` restricted by the non-empty parts of `filter`.
    async fn list_tasks(&self, filter: &Filter) -> ApiResult<TaskList>;

    /// `POST tasks`
    async fn create_task(&self, input: &TaskInput) -> ApiResult<TaskEnvelope>;

    /// `PUT tasks/{id}`
    async fn update_task(&self, id: &TaskId, input: &TaskInput) -> ApiResult<TaskEnvelope>;

    /// `DELETE tasks/{id}`
    async fn delete_task(&self, id: &TaskId) -> ApiResult<()>;

    /// `PUT profile`
    async fn update_profile(&self, input: &ProfileInput) -> ApiResult<ProfileEnvelope>;
}

#[async_trait]
impl<T: TaskApi + ?Sized> TaskApi for Arc<T> {
    async fn list_tasks(&self, filter: &Filter) -> ApiResult<TaskList> {
        (**self).list_tasks(filter).await
    }

    async fn create_task(&self, input: &TaskInput) -> ApiResult<TaskEnvelope> {
        (**self).create_task(input).await
    }

    async fn update_task(&self, id: &TaskId, input: &TaskInput) -> ApiResult<TaskEnvelope> {
        (**self).update_task(id, input).await
    }

    async fn delete_task(&self, id: &TaskId) -> ApiResult<()> {
        (**self).delete_task(id).await
    }

    async fn update_profile(&self, input: &ProfileInput) -> ApiResult<ProfileEnvelope> {
        (**self).update_profile(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn from_body_extracts_message() {
        let err = ApiError::from_body(Some(400), r#"{"message":"Title is required"}"#);
        assert_eq!(err.message(), Some("Title is required"));
        assert_eq!(err.to_string(), "Title is required");
    }

    #[test]
    fn from_body_without_message_falls_back() {
        let err = ApiError::from_body(Some(500), "<html>oops</html>");
        assert_eq!(err.message(), None);
        assert_eq!(err.user_message("Failed to save task"), "Failed to save task");

        let blank = ApiError::from_body(None, r#"{"message":"  "}"#);
        assert_eq!(blank.message(), None);
    }

    #[test]
    fn transport_failures_have_no_server_message() {
        assert_eq!(ApiError::Timeout.message(), None);
        assert_eq!(
            ApiError::Unreachable("connection refused".into()).user_message("Failed"),
            "Failed"
        );
    }
}
