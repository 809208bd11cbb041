use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = taskdeck::cli::Cli::parse();
    taskdeck::config::init_tracing(cli.log_filter.as_deref())?;

    let config = taskdeck::config::from_cli(&cli)?;
    let command = cli
        .command
        .clone()
        .unwrap_or_else(|| taskdeck::cli::CliCommand::List(Default::default()));

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    taskdeck::commands::execute(&config, command, stdin.lock(), &mut handle)?;

    Ok(())
}
