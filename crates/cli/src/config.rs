pub use taskdeck_core::config::*;

use anyhow::{Context, Result};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

pub const DEFAULT_LOG_DIRECTIVE: &str = "warn";

pub fn from_cli(cli: &Cli) -> Result<AppConfig> {
    AppConfig::discover(cli.data_dir.clone())
}

/// Install the stderr subscriber. `RUST_LOG` still refines the default directive.
pub fn init_tracing(filter: Option<&str>) -> Result<()> {
    let filter = filter.unwrap_or(DEFAULT_LOG_DIRECTIVE);
    let directive: Directive = filter
        .parse()
        .with_context(|| format!("invalid log directive '{filter}'"))?;
    let env_filter = EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_directive() {
        assert!(init_tracing(Some("taskdeck=loudly")).is_err());
    }
}
