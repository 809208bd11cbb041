use std::fmt;
use std::io::{BufRead, Write};

use anyhow::{anyhow, bail, Context, Result};
use taskdeck_client::projection::TaskRow;
use taskdeck_client::store::DELETE_PROMPT;
use taskdeck_client::{ListProjection, LoadState, Message, NoticeKind, Session, SessionOptions};
use taskdeck_core::draft::{ProfileField, TaskField};
use taskdeck_core::model::{Profile, TaskId};
use taskdeck_core::validation::Field as _;
use taskdeck_core::LocalApi;

use crate::cli::{
    AddArgs, CliCommand, DeleteArgs, EditArgs, ListArgs, ProfileCommand, ProfileSetArgs,
    TaskFieldArgs,
};
use crate::config::AppConfig;

const PROFILE_UPDATED: &str = "Profile updated successfully!";

/// Run one CLI command against the local backend. `input` answers confirmation prompts.
pub fn execute<R: BufRead, W: Write>(
    config: &AppConfig,
    command: CliCommand,
    input: R,
    mut writer: W,
) -> Result<()> {
    let api = LocalApi::new(config.clone()).context("failed to open local task store")?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    tracing::debug!(
        data_dir = %config.data_dir().display(),
        command = ?command,
        "executing command"
    );

    runtime.block_on(async {
        match command {
            CliCommand::List(args) => handle_list(&api, &args, &mut writer).await,
            CliCommand::Add(args) => handle_add(&api, &args, &mut writer).await,
            CliCommand::Edit(args) => handle_edit(&api, &args, &mut writer).await,
            CliCommand::Delete(args) => handle_delete(&api, &args, input, &mut writer).await,
            CliCommand::Profile(args) => match args.command {
                ProfileCommand::Show => handle_profile_show(&api, &mut writer),
                ProfileCommand::Set(args) => handle_profile_set(&api, &args, &mut writer).await,
            },
        }
    })
}

fn open_session(api: &LocalApi) -> Result<(Session, taskdeck_client::Command)> {
    let user = api.current_user().context("failed to load profile")?;
    Ok(Session::start(user, SessionOptions::default()))
}

/// Start a session with its task list loaded, failing if the fetch did not succeed.
async fn loaded_session(api: &LocalApi) -> Result<Session> {
    let (mut session, initial) = open_session(api)?;
    session.run(api, initial).await;
    ensure_loaded(&session)?;
    Ok(session)
}

fn ensure_loaded(session: &Session) -> Result<()> {
    if let LoadState::Error(err) = session.store().load_state() {
        bail!("failed to load tasks: {err}");
    }
    Ok(())
}

async fn handle_list<W: Write>(api: &LocalApi, args: &ListArgs, mut writer: W) -> Result<()> {
    let (mut session, initial) = open_session(api)?;
    let command = session
        .react(Message::FilterChanged(args.patch()))
        .unwrap_or(initial);
    session.run(api, command).await;
    ensure_loaded(&session)?;

    if let Some(summary) = session.filter().summary() {
        writeln!(writer, "Filter: {summary}")?;
    }
    match session.projection() {
        ListProjection::Empty { title, hint } => {
            writeln!(writer, "{title}")?;
            writeln!(writer, "{hint}")?;
        }
        ListProjection::Rows(rows) => {
            for row in rows {
                writeln!(writer, "{row}")?;
            }
        }
    }
    Ok(())
}

async fn handle_add<W: Write>(api: &LocalApi, args: &AddArgs, mut writer: W) -> Result<()> {
    let (mut session, _) = open_session(api)?;
    session.dispatch(api, Message::StartCreate).await;
    session
        .dispatch(
            api,
            Message::TaskFieldChanged(TaskField::Title, args.title.join(" ")),
        )
        .await;
    apply_task_fields(&mut session, api, &args.fields).await;
    session.dispatch(api, Message::SubmitTaskForm).await;

    report_task_form(&session, &mut writer)?;
    if let Some(task) = session.store().tasks().first() {
        writeln!(writer, "{}", TaskRow::from(task))?;
    }
    Ok(())
}

async fn handle_edit<W: Write>(api: &LocalApi, args: &EditArgs, mut writer: W) -> Result<()> {
    let mut session = loaded_session(api).await?;
    let id = TaskId::new(args.id.trim());
    session.dispatch(api, Message::StartEdit(id.clone())).await;
    if !session.task_form().is_open() {
        bail!("Task not found: {id}");
    }

    if let Some(title) = &args.title {
        session
            .dispatch(api, Message::TaskFieldChanged(TaskField::Title, title.clone()))
            .await;
    }
    apply_task_fields(&mut session, api, &args.fields).await;
    session.dispatch(api, Message::SubmitTaskForm).await;

    report_task_form(&session, &mut writer)?;
    if let Some(task) = session.store().get(&id) {
        writeln!(writer, "{}", TaskRow::from(task))?;
    }
    Ok(())
}

async fn apply_task_fields(session: &mut Session, api: &LocalApi, fields: &TaskFieldArgs) {
    let changes = [
        (TaskField::Description, fields.description.clone()),
        (TaskField::Status, fields.status.map(|s| s.as_str().to_string())),
        (
            TaskField::Priority,
            fields.priority.map(|p| p.as_str().to_string()),
        ),
        (TaskField::DueDate, fields.due_date.clone()),
    ];
    for (field, value) in changes {
        if let Some(value) = value {
            session
                .dispatch(api, Message::TaskFieldChanged(field, value))
                .await;
        }
    }
}

/// Print validation or save failures for the task form and turn them into an error.
fn report_task_form<W: Write>(session: &Session, mut writer: W) -> Result<()> {
    let form = session.task_form();
    if !form.errors().is_empty() {
        for (_, message) in form.errors().messages() {
            writeln!(writer, "{message}")?;
        }
        bail!("task was not saved");
    }
    if let Some(err) = form.submit_error() {
        bail!("{err}");
    }
    if let Some(notice) = session.notice() {
        writeln!(writer, "{}", notice.message)?;
    }
    Ok(())
}

async fn handle_delete<R: BufRead, W: Write>(
    api: &LocalApi,
    args: &DeleteArgs,
    input: R,
    mut writer: W,
) -> Result<()> {
    let mut session = loaded_session(api).await?;
    let id = TaskId::new(args.id.trim());
    session
        .dispatch(api, Message::DeleteRequested(id.clone()))
        .await;
    let title = match session.pending_delete() {
        Some(task) => task.title.clone(),
        None => bail!("Task not found: {id}"),
    };

    if !args.yes && !ask(input, &mut writer, DELETE_PROMPT)? {
        session.dispatch(api, Message::DeleteCancelled).await;
        writeln!(writer, "Delete cancelled")?;
        return Ok(());
    }

    session.dispatch(api, Message::DeleteConfirmed).await;
    if let Some(notice) = session.notice() {
        if notice.kind == NoticeKind::Error {
            return Err(anyhow!("{}", notice.message));
        }
    }
    writeln!(writer, "Deleted task '{title}'")?;
    Ok(())
}

fn ask<R: BufRead, W: Write>(mut input: R, mut writer: W, prompt: &str) -> Result<bool> {
    write!(writer, "{prompt} [y/N] ")?;
    writer.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

fn handle_profile_show<W: Write>(api: &LocalApi, mut writer: W) -> Result<()> {
    let profile = api.current_user().context("failed to load profile")?;
    write!(writer, "{}", ProfileCard(&profile))?;
    Ok(())
}

async fn handle_profile_set<W: Write>(
    api: &LocalApi,
    args: &ProfileSetArgs,
    mut writer: W,
) -> Result<()> {
    let (mut session, _) = open_session(api)?;
    let changes = [
        (ProfileField::Name, args.name.clone()),
        (ProfileField::Bio, args.bio.clone()),
        (ProfileField::Avatar, args.avatar.clone()),
    ];
    for (field, value) in changes {
        if let Some(value) = value {
            session
                .dispatch(api, Message::ProfileFieldChanged(field, value))
                .await;
        }
    }
    session.dispatch(api, Message::SubmitProfile).await;

    let form = session.profile_form();
    if !form.errors().is_empty() {
        for (field, message) in form.errors().messages() {
            writeln!(writer, "{}: {message}", field.label())?;
        }
        bail!("profile was not saved");
    }
    if let Some(err) = form.submit_error() {
        bail!("{err}");
    }
    if form.success_visible() {
        writeln!(writer, "{PROFILE_UPDATED}")?;
    }
    let profile = session.end();
    write!(writer, "{}", ProfileCard(&profile))?;
    Ok(())
}

struct ProfileCard<'a>(&'a Profile);

impl fmt::Display for ProfileCard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let profile = self.0;
        writeln!(f, "Name:   {}", profile.name)?;
        writeln!(f, "Email:  {}", profile.email)?;
        writeln!(f, "Bio:    {}", or_dash(&profile.bio))?;
        writeln!(f, "Avatar: {}", or_dash(&profile.avatar))
    }
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}
