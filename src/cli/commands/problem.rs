//! Problem CLI commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput};
use crate::domain::errors::DomainError;
use crate::domain::models::{Problem, VOTE_QUORUM};
use crate::domain::ports::ProblemRepository;

#[derive(Args, Debug)]
pub struct ProblemArgs {
    #[command(subcommand)]
    pub command: ProblemCommands,
}

#[derive(Subcommand, Debug)]
pub enum ProblemCommands {
    /// Create a problem open for voting
    Create {
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long, default_value = "general")]
        category: String,
        /// Tags (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Show a problem
    Show { id: Uuid },
}

#[derive(Debug, Serialize)]
pub struct ProblemOutput {
    #[serde(flatten)]
    pub problem: Problem,
}

impl CommandOutput for ProblemOutput {
    fn to_human(&self) -> String {
        let p = &self.problem;
        let mut lines = vec![
            format!("{} [{}]", p.title, p.id),
            format!("  status:   {}", p.status.as_str()),
            format!("  category: {}", p.category),
            format!("  votes:    {}/{VOTE_QUORUM}", p.vote_ids.len()),
        ];
        if !p.tags.is_empty() {
            lines.push(format!("  tags:     {}", p.tags.join(", ")));
        }
        for team_id in &p.selected_team_ids {
            lines.push(format!("  team:     {team_id}"));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: ProblemArgs, json_mode: bool) -> Result<()> {
    let ctx = AppContext::load().await?;
    let problem = match args.command {
        ProblemCommands::Create {
            title,
            description,
            category,
            tags,
        } => {
            let problem = Problem::new(title, description, category).with_tags(tags);
            problem.validate().map_err(DomainError::ValidationFailed)?;
            ctx.problems.create(&problem).await?;
            problem
        }
        ProblemCommands::Show { id } => ctx
            .problems
            .get(id)
            .await?
            .ok_or(DomainError::ProblemNotFound(id))?,
    };
    output(&ProblemOutput { problem }, json_mode);
    Ok(())
}
