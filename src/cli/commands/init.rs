//! Implementation of the `teamspace init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::setup::{create_config_dir, create_config_file, run_migrations, SetupPaths};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub initialized_path: PathBuf,
    pub config_written: bool,
    pub schema_version: i64,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("Initialized teamspace in {}", self.initialized_path.display())];
        if self.config_written {
            lines.push("  wrote .teamspace/config.yaml".to_string());
        } else {
            lines.push("  kept existing .teamspace/config.yaml (use --force to overwrite)".to_string());
        }
        lines.push(format!("  database schema at version {}", self.schema_version));
        lines.join("\n")
    }
}

pub async fn execute(args: InitArgs, json_mode: bool) -> Result<()> {
    let target_path = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(&args.path)
    };

    let paths = SetupPaths::in_dir(&target_path);
    create_config_dir(&paths)?;
    let config_written = create_config_file(&paths, args.force)?;
    let schema_version = run_migrations(&paths.database_file).await?;

    output(
        &InitOutput {
            success: true,
            initialized_path: target_path,
            config_written,
            schema_version,
        },
        json_mode,
    );
    Ok(())
}
