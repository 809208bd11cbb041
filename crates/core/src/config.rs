use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use once_cell::sync::Lazy;

static DEFAULT_DB_NAME: &str = "taskdeck.sqlite3";
static DEFAULT_USER_EMAIL: &str = "me@localhost";
static ENV_DATA_DIR: &str = "TASKDECK_DATA_DIR";
static ENV_USER_EMAIL: &str = "TASKDECK_USER_EMAIL";

static PROJECT_DIRS: Lazy<Option<ProjectDirs>> =
    Lazy::new(|| ProjectDirs::from("dev", "taskdeck", "taskdeck"));

#[derive(Debug, Clone)]
pub struct AppConfig {
    data_dir: PathBuf,
    db_path: PathBuf,
    user_email: String,
}

impl AppConfig {
    /// Construct [`AppConfig`] by resolving the data directory using the provided override,
    /// environment variables, and platform defaults.
    pub fn discover(data_dir_override: Option<PathBuf>) -> Result<Self> {
        let data_dir = resolve_data_dir(data_dir_override)?;
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir).with_context(|| {
                format!("Failed to create data directory at {}", data_dir.display())
            })?;
        }
        let mut config = Self::from_data_dir(data_dir)?;
        if let Ok(email) = env::var(ENV_USER_EMAIL) {
            config = config.with_user_email(email);
        }
        Ok(config)
    }

    /// Construct [`AppConfig`] directly from a resolved data directory.
    pub fn from_data_dir(data_dir: PathBuf) -> Result<Self> {
        let db_path = data_dir.join(DEFAULT_DB_NAME);
        Ok(Self {
            data_dir,
            db_path,
            user_email: DEFAULT_USER_EMAIL.to_string(),
        })
    }

    pub fn with_user_email(mut self, email: impl Into<String>) -> Self {
        let email = email.into();
        if !email.trim().is_empty() {
            self.user_email = email.trim().to_string();
        }
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Email of the signed-in user; the local backend keys the profile by it.
    pub fn user_email(&self) -> &str {
        &self.user_email
    }
}

fn resolve_data_dir(data_dir_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = data_dir_override {
        return Ok(dir);
    }

    if let Ok(env_dir) = env::var(ENV_DATA_DIR) {
        return Ok(PathBuf::from(env_dir));
    }

    if cfg!(debug_assertions) {
        let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let dev_dir = manifest_dir.join("..").join("..").join("tmp").join("dev-taskdeck");
        return Ok(dev_dir);
    }

    if let Some(project) = &*PROJECT_DIRS {
        return Ok(project.data_dir().to_path_buf());
    }

    if let Some(base) = BaseDirs::new() {
        return Ok(base.home_dir().join(".taskdeck"));
    }

    Ok(env::current_dir()?.join(".taskdeck"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn from_data_dir_places_database_inside() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::from_data_dir(dir.path().to_path_buf()).unwrap();
        assert_eq!(config.db_path(), dir.path().join("taskdeck.sqlite3"));
        assert_eq!(config.user_email(), "me@localhost");
    }

    #[test]
    fn discover_honours_override_and_creates_it() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested").join("data");
        let config = AppConfig::discover(Some(nested.clone())).unwrap();
        assert!(nested.exists());
        assert_eq!(config.data_dir(), nested.as_path());
    }

    #[test]
    fn blank_email_keeps_default() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::from_data_dir(dir.path().to_path_buf())
            .unwrap()
            .with_user_email("  ");
        assert_eq!(config.user_email(), "me@localhost");
    }
}
