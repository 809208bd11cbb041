pub mod api;
pub mod config;
pub mod database;
pub mod draft;
pub mod model;
pub mod services;
pub mod validation;

pub use api::{ApiError, ApiResult, TaskApi};
pub use config::AppConfig;
pub use database::Database;
pub use draft::{Draft, ProfileDraft, ProfileField, TaskDraft, TaskField};
pub use model::*;
pub use services::LocalApi;
pub use validation::{FieldError, FieldErrors, Validate};
