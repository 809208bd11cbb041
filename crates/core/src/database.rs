use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{named_params, types::Value, Connection, Row, ToSql};
use ulid::Ulid;

use crate::config::AppConfig;
use crate::model::{Filter, Profile, ProfileInput, Task, TaskId, TaskInput};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn initialize(config: &AppConfig) -> Result<Self> {
        let conn = Connection::open(config.db_path()).with_context(|| {
            format!("Failed to open database at {}", config.db_path().display())
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to configure SQLite WAL mode")?;

        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Tasks matching `filter`, newest first.
    pub fn fetch_tasks(&self, filter: &Filter) -> Result<Vec<Task>> {
        let mut sql = String::from(
            "SELECT id, title, description, status, priority, due_date, created_at \
             FROM tasks WHERE 1=1",
        );
        let mut values: Vec<Value> = Vec::new();

        let search = filter.search.trim();
        if !search.is_empty() {
            let needle = format!("%{}%", escape_like(search));
            sql.push_str(
                " AND (title LIKE ? ESCAPE '\\' OR IFNULL(description, '') LIKE ? ESCAPE '\\')",
            );
            values.push(Value::from(needle.clone()));
            values.push(Value::from(needle));
        }

        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            values.push(Value::from(status.as_str().to_string()));
        }

        if let Some(priority) = filter.priority {
            sql.push_str(" AND priority = ?");
            values.push(Value::from(priority.as_str().to_string()));
        }

        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();
        let mut rows = stmt.query(&param_refs[..])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(map_task(row)?);
        }
        Ok(tasks)
    }

    pub fn fetch_task(&self, id: &TaskId) -> Result<Option<Task>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, status, priority, due_date, created_at \
             FROM tasks WHERE id = ? LIMIT 1",
        )?;
        let mut rows = stmt.query([id.as_str()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(map_task(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn insert_task(&self, input: &TaskInput) -> Result<Task> {
        let id = TaskId::new(Ulid::new().to_string());
        let now = timestamp(Utc::now());

        self.conn.execute(
            "INSERT INTO tasks (id, title, description, status, priority, due_date, created_at, updated_at)
             VALUES (:id, :title, :description, :status, :priority, :due_date, :created_at, :updated_at)",
            named_params![
                ":id": id.as_str(),
                ":title": &input.title,
                ":description": input.description.as_deref(),
                ":status": input.status.as_str(),
                ":priority": input.priority.as_str(),
                ":due_date": input.due_date.map(timestamp),
                ":created_at": &now,
                ":updated_at": &now,
            ],
        )?;

        self.fetch_task(&id)?
            .ok_or_else(|| anyhow!("Task {} vanished after insert", id))
    }

    pub fn update_task(&self, id: &TaskId, input: &TaskInput) -> Result<Option<Task>> {
        let affected = self.conn.execute(
            "UPDATE tasks SET
                title = :title,
                description = :description,
                status = :status,
                priority = :priority,
                due_date = :due_date,
                updated_at = :updated_at
             WHERE id = :id",
            named_params![
                ":title": &input.title,
                ":description": input.description.as_deref(),
                ":status": input.status.as_str(),
                ":priority": input.priority.as_str(),
                ":due_date": input.due_date.map(timestamp),
                ":updated_at": timestamp(Utc::now()),
                ":id": id.as_str(),
            ],
        )?;
        if affected == 0 {
            return Ok(None);
        }
        self.fetch_task(id)
    }

    pub fn delete_task(&self, id: &TaskId) -> Result<bool> {
        let affected = self.conn.execute(
            "DELETE FROM tasks WHERE id = :id",
            named_params![":id": id.as_str()],
        )?;
        Ok(affected > 0)
    }

    /// Profile for `email`, created with a name derived from the address on first use.
    pub fn load_profile(&self, email: &str) -> Result<Profile> {
        if let Some(profile) = self.fetch_profile(email)? {
            return Ok(profile);
        }

        let name = email.split('@').next().unwrap_or(email).to_string();
        self.conn.execute(
            "INSERT INTO profiles (email, name, bio, avatar) VALUES (:email, :name, '', '')",
            named_params![":email": email, ":name": &name],
        )?;
        Ok(Profile {
            email: email.to_string(),
            name,
            bio: String::new(),
            avatar: String::new(),
        })
    }

    pub fn save_profile(&self, email: &str, input: &ProfileInput) -> Result<Profile> {
        self.load_profile(email)?;
        self.conn.execute(
            "UPDATE profiles SET name = :name, bio = :bio, avatar = :avatar WHERE email = :email",
            named_params![
                ":name": &input.name,
                ":bio": &input.bio,
                ":avatar": &input.avatar,
                ":email": email,
            ],
        )?;
        self.fetch_profile(email)?
            .ok_or_else(|| anyhow!("Profile {} vanished after update", email))
    }

    fn fetch_profile(&self, email: &str) -> Result<Option<Profile>> {
        let mut stmt = self
            .conn
            .prepare("SELECT email, name, bio, avatar FROM profiles WHERE email = ? LIMIT 1")?;
        let mut rows = stmt.query([email])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Profile {
                email: row.get(0)?,
                name: row.get(1)?,
                bio: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                avatar: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            }))
        } else {
            Ok(None)
        }
    }

    fn apply_migrations(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                priority TEXT NOT NULL DEFAULT 'medium',
                due_date TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS profiles (
                email TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                bio TEXT DEFAULT '',
                avatar TEXT DEFAULT ''
             );
             CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
             CREATE INDEX IF NOT EXISTS idx_tasks_priority ON tasks(priority);
             CREATE INDEX IF NOT EXISTS idx_tasks_created ON tasks(created_at);
            ",
        )?;
        Ok(())
    }
}

fn map_task(row: &Row<'_>) -> Result<Task> {
    Ok(Task {
        id: TaskId::new(row.get::<_, String>(0)?),
        title: row.get(1)?,
        description: row.get(2)?,
        status: Some(row.get::<_, String>(3)?).into(),
        priority: Some(row.get::<_, String>(4)?).into(),
        due_date: parse_datetime(row.get::<_, Option<String>>(5)?),
        created_at: parse_datetime_required(row.get::<_, String>(6)?)?,
    })
}

// Fixed precision keeps lexical order equal to chronological order.
fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn parse_datetime(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_datetime_required(raw: String) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| anyhow!("Failed to parse timestamp '{}': {}", raw, e))
}
