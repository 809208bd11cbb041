//! Editable, as-typed representations of tasks and profiles.

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, NaiveTime, SecondsFormat, Utc};

use crate::model::{Priority, Profile, ProfileInput, Task, TaskId, TaskInput, TaskStatus};
use crate::validation::{
    self, absolute_url, max_chars, min_chars, optional_date, required, FieldErrors, Validate,
    BIO_MAX_CHARS, NAME_MIN_CHARS,
};

/// A draft that can be seeded from an entity and turned into a request body.
pub trait Draft: Clone + Default + Validate {
    /// The persisted entity the draft edits.
    type Source;
    /// What identifies the edited entity remotely.
    type Key: Clone + fmt::Debug + PartialEq;
    /// Request body produced on submit.
    type Input: Clone + fmt::Debug;

    /// Fallback shown when a save fails without a server message.
    const SAVE_FAILED: &'static str;

    fn from_source(source: &Self::Source) -> Self;
    fn key_of(source: &Self::Source) -> Self::Key;
    fn set(&mut self, field: Self::Field, value: String);
    fn get(&self, field: Self::Field) -> &str;
    fn to_input(&self) -> Self::Input;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskField {
    Title,
    Description,
    Status,
    Priority,
    DueDate,
}

impl validation::Field for TaskField {
    fn label(self) -> &'static str {
        match self {
            TaskField::Title => "Title",
            TaskField::Description => "Description",
            TaskField::Status => "Status",
            TaskField::Priority => "Priority",
            TaskField::DueDate => "Due date",
        }
    }
}

impl FromStr for TaskField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(TaskField::Title),
            "description" => Ok(TaskField::Description),
            "status" => Ok(TaskField::Status),
            "priority" => Ok(TaskField::Priority),
            "dueDate" | "due_date" | "due" => Ok(TaskField::DueDate),
            other => Err(anyhow!("Unknown task field '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub due_date: String,
}

impl Default for TaskDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            status: TaskStatus::default().as_str().to_string(),
            priority: Priority::default().as_str().to_string(),
            due_date: String::new(),
        }
    }
}

impl Validate for TaskDraft {
    type Field = TaskField;

    fn validate(&self) -> FieldErrors<TaskField> {
        let mut errors = FieldErrors::new();
        errors.check(TaskField::Title, required(&self.title));
        errors.check(TaskField::DueDate, optional_date(&self.due_date));
        errors
    }
}

impl Draft for TaskDraft {
    type Source = Task;
    type Key = TaskId;
    type Input = TaskInput;

    const SAVE_FAILED: &'static str = "Failed to save task";

    fn from_source(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            status: task.status.as_str().to_string(),
            priority: task.priority.as_str().to_string(),
            due_date: task.due_date.map(due_date_text).unwrap_or_default(),
        }
    }

    fn key_of(task: &Task) -> TaskId {
        task.id.clone()
    }

    fn set(&mut self, field: TaskField, value: String) {
        match field {
            TaskField::Title => self.title = value,
            TaskField::Description => self.description = value,
            TaskField::Status => self.status = value,
            TaskField::Priority => self.priority = value,
            TaskField::DueDate => self.due_date = value,
        }
    }

    fn get(&self, field: TaskField) -> &str {
        match field {
            TaskField::Title => &self.title,
            TaskField::Description => &self.description,
            TaskField::Status => &self.status,
            TaskField::Priority => &self.priority,
            TaskField::DueDate => &self.due_date,
        }
    }

    fn to_input(&self) -> TaskInput {
        let description = self.description.trim();
        TaskInput {
            title: self.title.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            status: self.status.parse().unwrap_or_default(),
            priority: self.priority.parse().unwrap_or_default(),
            due_date: validation::parse_date(&self.due_date).and_then(Result::ok),
        }
    }
}

/// Date-only text for midnight UTC, full RFC 3339 otherwise, so re-parsing is lossless.
fn due_date_text(due: DateTime<Utc>) -> String {
    if due.time() == NaiveTime::MIN {
        due.format("%Y-%m-%d").to_string()
    } else {
        due.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProfileField {
    Name,
    Bio,
    Avatar,
}

impl validation::Field for ProfileField {
    fn label(self) -> &'static str {
        match self {
            ProfileField::Name => "Name",
            ProfileField::Bio => "Bio",
            ProfileField::Avatar => "Avatar",
        }
    }
}

impl FromStr for ProfileField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(ProfileField::Name),
            "bio" => Ok(ProfileField::Bio),
            "avatar" => Ok(ProfileField::Avatar),
            other => Err(anyhow!("Unknown profile field '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDraft {
    pub name: String,
    pub bio: String,
    pub avatar: String,
}

impl Validate for ProfileDraft {
    type Field = ProfileField;

    fn validate(&self) -> FieldErrors<ProfileField> {
        let mut errors = FieldErrors::new();
        errors.check(
            ProfileField::Name,
            required(&self.name).and_then(|_| min_chars(&self.name, NAME_MIN_CHARS)),
        );
        errors.check(ProfileField::Bio, max_chars(&self.bio, BIO_MAX_CHARS));
        errors.check(ProfileField::Avatar, absolute_url(&self.avatar));
        errors
    }
}

impl Draft for ProfileDraft {
    type Source = Profile;
    type Key = String;
    type Input = ProfileInput;

    const SAVE_FAILED: &'static str = "Failed to update profile";

    fn from_source(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            bio: profile.bio.clone(),
            avatar: profile.avatar.clone(),
        }
    }

    fn key_of(profile: &Profile) -> String {
        profile.email.clone()
    }

    fn set(&mut self, field: ProfileField, value: String) {
        match field {
            ProfileField::Name => self.name = value,
            ProfileField::Bio => self.bio = value,
            ProfileField::Avatar => self.avatar = value,
        }
    }

    fn get(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::Name => &self.name,
            ProfileField::Bio => &self.bio,
            ProfileField::Avatar => &self.avatar,
        }
    }

    fn to_input(&self) -> ProfileInput {
        ProfileInput {
            name: self.name.trim().to_string(),
            bio: self.bio.clone(),
            avatar: self.avatar.trim().to_string(),
        }
    }
}
