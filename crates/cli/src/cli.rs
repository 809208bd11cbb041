use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::{FilterPatch, Priority, TaskStatus};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "taskdeck",
    version,
    about = "A personal task tracker with a local backend.",
    after_help = "Examples:\n  taskdeck                       List tasks (same as `taskdeck list`)\n  taskdeck add Pay rent --priority high --due 2025-02-01\n  taskdeck list --status pending --search rent\n  taskdeck delete 01HV3 --yes\n  taskdeck profile set --name \"Sam Carter\""
)]
pub struct Cli {
    /// Override the data directory (defaults to platform-specific app dir)
    #[arg(long, value_name = "PATH", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Tracing filter written to stderr (e.g. "info", "taskdeck_client=debug")
    #[arg(long = "log", value_name = "DIRECTIVE", global = true)]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// List tasks, optionally filtered (default command)
    List(ListArgs),
    /// Create a task
    Add(AddArgs),
    /// Change fields of an existing task
    Edit(EditArgs),
    /// Delete a task after confirmation
    Delete(DeleteArgs),
    /// Show or update the signed-in user's profile
    Profile(ProfileArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Case-insensitive text matched against title and description
    #[arg(long)]
    pub search: Option<String>,

    #[arg(long, value_enum)]
    pub status: Option<TaskStatus>,

    #[arg(long, value_enum)]
    pub priority: Option<Priority>,
}

impl ListArgs {
    pub fn patch(&self) -> FilterPatch {
        let mut patch = FilterPatch::default();
        if let Some(search) = &self.search {
            patch = patch.with_search(search.trim());
        }
        if self.status.is_some() {
            patch = patch.with_status(self.status);
        }
        if self.priority.is_some() {
            patch = patch.with_priority(self.priority);
        }
        patch
    }
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Task title
    #[arg(value_name = "TITLE", required = true)]
    pub title: Vec<String>,

    #[command(flatten)]
    pub fields: TaskFieldArgs,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Id of the task to change
    #[arg(value_name = "ID")]
    pub id: String,

    /// Replace the title
    #[arg(long)]
    pub title: Option<String>,

    #[command(flatten)]
    pub fields: TaskFieldArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct TaskFieldArgs {
    #[arg(long)]
    pub description: Option<String>,

    /// Defaults to pending for new tasks
    #[arg(long, value_enum)]
    pub status: Option<TaskStatus>,

    /// Defaults to medium for new tasks
    #[arg(long, value_enum)]
    pub priority: Option<Priority>,

    /// Due date as YYYY-MM-DD or RFC 3339; pass an empty string to clear it
    #[arg(long = "due", value_name = "DATE")]
    pub due_date: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Id of the task to delete
    #[arg(value_name = "ID")]
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: ProfileCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProfileCommand {
    /// Print the current profile
    Show,
    /// Update profile fields; omitted fields keep their value
    Set(ProfileSetArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProfileSetArgs {
    #[arg(long)]
    pub name: Option<String>,

    /// Up to 500 characters
    #[arg(long)]
    pub bio: Option<String>,

    /// Absolute URL of an avatar image; empty clears it
    #[arg(long)]
    pub avatar: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn parses_add_with_fields() {
        let cli = Cli::try_parse_from([
            "taskdeck",
            "add",
            "Pay",
            "rent",
            "--priority",
            "high",
            "--status",
            "in-progress",
        ])
        .unwrap();

        let Some(CliCommand::Add(args)) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(args.title, vec!["Pay", "rent"]);
        assert_eq!(args.fields.priority, Some(Priority::High));
        assert_eq!(args.fields.status, Some(TaskStatus::InProgress));
    }

    #[test]
    fn list_args_only_patch_given_dimensions() {
        let args = ListArgs {
            search: Some("  tax ".into()),
            ..ListArgs::default()
        };
        assert_eq!(args.patch(), FilterPatch::search("tax"));
        assert!(ListArgs::default().patch().is_empty());
    }

    #[rstest]
    #[case(&["taskdeck", "list"], FilterPatch::default())]
    #[case(
        &["taskdeck", "list", "--status", "completed"],
        FilterPatch::status(Some(TaskStatus::Completed))
    )]
    #[case(
        &["taskdeck", "list", "--priority", "low", "--search", " tax "],
        FilterPatch::search("tax").with_priority(Some(Priority::Low))
    )]
    fn list_flags_become_filter_patch(#[case] argv: &[&str], #[case] expected: FilterPatch) {
        let cli = Cli::try_parse_from(argv).unwrap();
        let Some(CliCommand::List(args)) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.patch(), expected);
    }

    #[rstest]
    #[case("urgent")]
    #[case("done")]
    fn rejects_unknown_enum_values(#[case] value: &str) {
        assert!(Cli::try_parse_from(["taskdeck", "list", "--status", value]).is_err());
        assert!(Cli::try_parse_from(["taskdeck", "add", "x", "--priority", value]).is_err());
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from(["taskdeck", "delete", "abc", "--yes", "--log", "debug"])
            .unwrap();
        assert_eq!(cli.log_filter.as_deref(), Some("debug"));
        assert!(matches!(
            cli.command,
            Some(CliCommand::Delete(DeleteArgs { yes: true, .. }))
        ));
    }
}
