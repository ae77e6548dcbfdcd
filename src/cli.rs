// src/cli.rs
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "jobscout")]
#[command(about = "Automated LinkedIn job search, scoring and notification")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run one search pass now
    Run,
    /// Run daily at the configured schedule time
    Schedule,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_no_subcommand() {
        let cli = Cli::parse_from(["jobscout"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parses_subcommands() {
        assert!(matches!(
            Cli::parse_from(["jobscout", "run"]).command,
            Some(Command::Run)
        ));
        assert!(matches!(
            Cli::parse_from(["jobscout", "schedule"]).command,
            Some(Command::Schedule)
        ));
    }
}
