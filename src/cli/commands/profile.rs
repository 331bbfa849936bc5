//! Profile CLI commands.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput};
use crate::domain::errors::DomainError;
use crate::domain::models::{ActorRole, Profile};
use crate::domain::ports::ProfileRepository;

#[derive(Args, Debug)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: ProfileCommands,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Create a profile
    Create {
        name: String,
        /// contributor, mentor or admin
        #[arg(short, long, default_value = "contributor")]
        role: String,
        #[arg(short, long, default_value = "")]
        bio: String,
        /// Skills (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        skills: Vec<String>,
    },
    /// Show a profile
    Show { id: Uuid },
}

#[derive(Debug, Serialize)]
pub struct ProfileOutput {
    #[serde(flatten)]
    pub profile: Profile,
}

impl CommandOutput for ProfileOutput {
    fn to_human(&self) -> String {
        let p = &self.profile;
        let mut lines = vec![format!("{} ({}) [{}]", p.name, p.role.as_str(), p.id)];
        if !p.bio.is_empty() {
            lines.push(format!("  bio:    {}", p.bio));
        }
        if !p.skills.is_empty() {
            lines.push(format!("  skills: {}", p.skills.join(", ")));
        }
        if !p.team_ids.is_empty() {
            let teams: Vec<String> = p.team_ids.iter().map(Uuid::to_string).collect();
            lines.push(format!("  teams:  {}", teams.join(", ")));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: ProfileArgs, json_mode: bool) -> Result<()> {
    let ctx = AppContext::load().await?;
    let profile = match args.command {
        ProfileCommands::Create {
            name,
            role,
            bio,
            skills,
        } => {
            let Some(role) = ActorRole::from_str(&role) else {
                bail!("unknown role '{role}', expected contributor, mentor or admin");
            };
            let profile = Profile::new(name, role).with_bio(bio).with_skills(skills);
            ctx.profiles.create(&profile).await?;
            profile
        }
        ProfileCommands::Show { id } => ctx
            .profiles
            .get(id)
            .await?
            .ok_or(DomainError::ProfileNotFound(id))?,
    };
    output(&ProfileOutput { profile }, json_mode);
    Ok(())
}
