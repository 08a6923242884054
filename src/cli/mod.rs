//! CLI module for the job categorizer
//!
//! - `serve`: HTTP API with the background registry refresh (default)
//! - `refresh`: rebuild the category registry once and exit

pub mod refresh;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Job title categorizer - maps job titles to service categories
#[derive(Parser)]
#[command(name = "job-categorizer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Default, Debug, PartialEq)]
pub enum Command {
    /// Run the API server (default)
    #[default]
    Serve,

    /// Rebuild the category registry once, warming the embedding cache
    Refresh,
}

/// Loads `.env`, configuration and logging shared by every command
fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["job-categorizer", "refresh"]).unwrap();
        assert_eq!(cli.command, Some(Command::Refresh));

        let cli = Cli::try_parse_from(["job-categorizer"]).unwrap();
        assert_eq!(cli.command.unwrap_or_default(), Command::Serve);
    }

    #[test]
    fn test_rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["job-categorizer", "ui"]).is_err());
    }
}
