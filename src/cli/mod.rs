//! Command-line interface.

pub mod commands;
pub mod context;
pub mod output;

use clap::{Parser, Subcommand};
use console::style;

use crate::domain::errors::DomainError;
use commands::{
    config::ConfigArgs, init::InitArgs, problem::ProblemArgs, profile::ProfileArgs,
    similarity::SimilarityArgs, team::TeamArgs, tree::TreeArgs, vote::VoteArgs, workspace::WorkspaceArgs,
};

#[derive(Parser, Debug)]
#[command(name = "teamspace")]
#[command(about = "Teamspace - shared team workspaces and vote-driven team formation", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize .teamspace configuration and database
    Init(InitArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
    /// Problem management
    Problem(ProblemArgs),
    /// Profile management
    Profile(ProfileArgs),
    /// Cast votes and inspect voting state
    Vote(VoteArgs),
    /// Team lifecycle
    Team(TeamArgs),
    /// Edit a team workspace
    Ws(WorkspaceArgs),
    /// Render a team workspace as a tree
    Tree(TreeArgs),
    /// Score the similarity of two texts
    Similarity(SimilarityArgs),
}

/// Exit code for an error, grouped by kind.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<DomainError>() {
        Some(e) if e.is_validation() => 2,
        Some(e) if e.is_not_found() => 3,
        Some(e) if e.is_conflict() => 4,
        _ => 1,
    }
}

/// Print an error and exit.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    let code = exit_code(&err);
    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": format!("{err:#}"),
            "code": code,
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{} {err:#}", style("error:").red().bold());
    }
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use uuid::Uuid;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_exit_codes_follow_error_kind() {
        let conflict = anyhow::Error::new(DomainError::DuplicateVote {
            problem_id: Uuid::nil(),
            voter_id: Uuid::nil(),
        });
        assert_eq!(exit_code(&conflict), 4);
        assert_eq!(exit_code(&anyhow::Error::new(DomainError::TeamNotFound(Uuid::nil()))), 3);
        assert_eq!(exit_code(&anyhow::anyhow!("io")), 1);
    }

    #[test]
    fn test_global_json_flag() {
        let cli = Cli::try_parse_from(["teamspace", "config", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Config(_)));
    }
}
