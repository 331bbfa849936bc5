//! Vote CLI commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::style;
use serde::Serialize;
use uuid::Uuid;

use crate::cli::context::AppContext;
use crate::cli::output::{output, team_table, CommandOutput};
use crate::domain::models::{Team, VoteTally};

#[derive(Args, Debug)]
pub struct VoteArgs {
    #[command(subcommand)]
    pub command: VoteCommands,
}

#[derive(Subcommand, Debug)]
pub enum VoteCommands {
    /// Cast a vote; the vote that completes the quorum forms the team
    Cast { problem_id: Uuid, voter_id: Uuid },
    /// Show the vote count and team of a problem
    Status { problem_id: Uuid },
    /// Finish a formation or link-back that failed earlier
    Reconcile { problem_id: Uuid },
}

#[derive(Debug, Serialize)]
pub struct VoteOutput {
    pub tally: VoteTally,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_id: Option<Uuid>,
    /// Team formed or found by this command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,
}

impl CommandOutput for VoteOutput {
    fn to_human(&self) -> String {
        let tally = &self.tally;
        let mut lines = Vec::new();
        if let Some(vote_id) = self.vote_id {
            lines.push(format!("Vote recorded [{vote_id}]"));
        }
        let state = if tally.is_closed() {
            style("closed").red().to_string()
        } else {
            style(format!("{} more needed", tally.remaining())).green().to_string()
        };
        lines.push(format!("Votes: {}/{} ({state})", tally.votes, tally.quorum));

        match (&self.team, tally.team_id) {
            (Some(team), _) => {
                lines.push(format!("{} {} [{}]", style("Team:").bold(), team.name, team.id));
                lines.push(team_table(team));
            }
            (None, Some(team_id)) => lines.push(format!("Team: {team_id}")),
            (None, None) => {}
        }
        lines.join("\n")
    }
}

pub async fn execute(args: VoteArgs, json_mode: bool) -> Result<()> {
    let ctx = AppContext::load().await?;
    let result = match args.command {
        VoteCommands::Cast { problem_id, voter_id } => {
            let outcome = ctx.formation.cast_vote(problem_id, voter_id).await?;
            VoteOutput {
                tally: outcome.tally,
                vote_id: Some(outcome.vote.id),
                team: outcome.team,
            }
        }
        VoteCommands::Status { problem_id } => VoteOutput {
            tally: ctx.formation.vote_status(problem_id).await?,
            vote_id: None,
            team: None,
        },
        VoteCommands::Reconcile { problem_id } => {
            let team = ctx.formation.reconcile(problem_id).await?;
            VoteOutput {
                tally: ctx.formation.vote_status(problem_id).await?,
                vote_id: None,
                team,
            }
        }
    };
    output(&result, json_mode);
    Ok(())
}
