//! Team CLI commands.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use crate::cli::context::AppContext;
use crate::cli::output::{output, short_id, team_table, CommandOutput};
use crate::domain::models::{Team, TeamStatus};

#[derive(Args, Debug)]
pub struct TeamArgs {
    #[command(subcommand)]
    pub command: TeamCommands,
}

#[derive(Subcommand, Debug)]
pub enum TeamCommands {
    /// Show a team and its members
    Show { id: Uuid },
    /// List the teams of a member
    List {
        #[arg(long)]
        member: Uuid,
    },
    /// Form a team by hand, bypassing voting
    Form {
        problem_id: Uuid,
        #[arg(long)]
        leader: Uuid,
        /// Members (comma-separated)
        #[arg(long, value_delimiter = ',')]
        members: Vec<Uuid>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Report progress
    Progress {
        id: Uuid,
        phase: String,
        /// 0-100
        percentage: u8,
    },
    /// Assign a mentor
    Mentor { id: Uuid, mentor_id: Uuid },
    /// Move to active, submitted, reviewed or archived
    Status { id: Uuid, status: String },
}

#[derive(Debug, Serialize)]
pub struct TeamOutput {
    #[serde(flatten)]
    pub team: Team,
}

impl CommandOutput for TeamOutput {
    fn to_human(&self) -> String {
        let t = &self.team;
        let mut lines = vec![
            format!("{} [{}]", t.name, t.id),
            format!("  problem:  {}", t.problem_id),
            format!("  status:   {}", t.status.as_str()),
            format!("  progress: {} ({}%)", t.progress.phase, t.progress.percentage),
            format!("  formed:   {}", t.formation.as_str()),
        ];
        if let Some(mentor) = t.mentor_id {
            lines.push(format!("  mentor:   {mentor}"));
        }
        lines.push(team_table(t));
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct TeamListOutput {
    pub teams: Vec<Team>,
}

impl CommandOutput for TeamListOutput {
    fn to_human(&self) -> String {
        if self.teams.is_empty() {
            return "No teams found.".to_string();
        }
        self.teams
            .iter()
            .map(|t| format!("{}  {:<10} {}", short_id(&t.id), t.status.as_str(), t.name))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub async fn execute(args: TeamArgs, json_mode: bool) -> Result<()> {
    let ctx = AppContext::load().await?;
    let team = match args.command {
        TeamCommands::List { member } => {
            let teams = ctx.teams.list_for_member(member).await?;
            output(&TeamListOutput { teams }, json_mode);
            return Ok(());
        }
        TeamCommands::Show { id } => ctx.teams.get(id).await?,
        TeamCommands::Form {
            problem_id,
            leader,
            members,
            name,
        } => {
            ctx.formation
                .form_team_manually(problem_id, name, leader, members)
                .await?
        }
        TeamCommands::Progress { id, phase, percentage } => {
            ctx.teams.update_progress(id, phase, percentage).await?
        }
        TeamCommands::Mentor { id, mentor_id } => ctx.teams.assign_mentor(id, mentor_id).await?,
        TeamCommands::Status { id, status } => {
            let Some(status) = TeamStatus::from_str(&status) else {
                bail!("unknown status '{status}', expected active, submitted, reviewed or archived");
            };
            ctx.teams.transition_status(id, status).await?
        }
    };
    output(&TeamOutput { team }, json_mode);
    Ok(())
}
