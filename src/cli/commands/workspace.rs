//! Workspace editing commands (`teamspace ws ...`).

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

use crate::cli::context::AppContext;
use crate::cli::output::{output, short_id, CommandOutput};
use crate::domain::models::workspace::split_full_path;
use crate::domain::models::WorkspaceNode;
use crate::services::UpsertNode;

#[derive(Args, Debug)]
pub struct WorkspaceArgs {
    #[command(subcommand)]
    pub command: WorkspaceCommands,
}

#[derive(Subcommand, Debug)]
pub enum WorkspaceCommands {
    /// Create a folder or file, or save a file's content
    Put {
        team_id: Uuid,
        /// Full path, e.g. src/main.py
        full_path: String,
        /// Create a folder instead of a file
        #[arg(long, conflicts_with_all = ["content", "from_file"])]
        folder: bool,
        /// Inline file content
        #[arg(long)]
        content: Option<String>,
        /// Read file content from a local file
        #[arg(long, conflicts_with = "content")]
        from_file: Option<PathBuf>,
        #[arg(long)]
        language: Option<String>,
        #[arg(long, default_value_t = Uuid::nil())]
        author: Uuid,
    },
    /// Rename or move a node
    Mv {
        node_id: Uuid,
        #[arg(long)]
        name: Option<String>,
        /// New parent folder path ("" for the root)
        #[arg(long)]
        path: Option<String>,
    },
    /// Delete a node (folders take their subtree)
    Rm { node_id: Uuid },
    /// Flat listing ordered by path
    Ls { team_id: Uuid },
}

#[derive(Debug, Serialize)]
pub struct NodeOutput {
    pub action: &'static str,
    pub node: WorkspaceNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_full_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descendants_moved: Option<u64>,
}

impl CommandOutput for NodeOutput {
    fn to_human(&self) -> String {
        let full = self.node.full_path();
        match (&self.old_full_path, self.descendants_moved) {
            (Some(old), Some(moved)) => {
                format!("{} {old} -> {full} ({moved} descendants moved)", self.action)
            }
            _ => format!("{} {full} [{}]", self.action, self.node.id),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RemovedOutput {
    pub removed_ids: Vec<Uuid>,
}

impl CommandOutput for RemovedOutput {
    fn to_human(&self) -> String {
        format!("removed {} node(s)", self.removed_ids.len())
    }
}

#[derive(Debug, Serialize)]
pub struct ListingOutput {
    pub files: Vec<WorkspaceNode>,
}

impl CommandOutput for ListingOutput {
    fn to_human(&self) -> String {
        if self.files.is_empty() {
            return "Workspace is empty.".to_string();
        }
        self.files
            .iter()
            .map(|n| format!("{}  {:<6} {}", short_id(&n.id), n.node_type.as_str(), n.full_path()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub async fn execute(args: WorkspaceArgs, json_mode: bool) -> Result<()> {
    let ctx = AppContext::load().await?;
    match args.command {
        WorkspaceCommands::Put {
            team_id,
            full_path,
            folder,
            content,
            from_file,
            language,
            author,
        } => {
            let (path, filename) = split_full_path(full_path.trim_matches('/'));
            let request = if folder {
                UpsertNode::folder(team_id, author, path, filename)
            } else {
                let content = match from_file {
                    Some(file) => tokio::fs::read_to_string(&file)
                        .await
                        .with_context(|| format!("Failed to read {}", file.display()))?,
                    None => content.unwrap_or_default(),
                };
                let request = UpsertNode::file(team_id, author, path, filename, &content);
                match &language {
                    Some(language) => request.with_language(language),
                    None => request,
                }
            };
            let outcome = ctx.workspace.upsert(request, None).await?;
            output(
                &NodeOutput {
                    action: if outcome.created { "created" } else { "updated" },
                    node: outcome.node,
                    old_full_path: None,
                    descendants_moved: None,
                },
                json_mode,
            );
        }
        WorkspaceCommands::Mv { node_id, name, path } => {
            let outcome = ctx
                .workspace
                .rename(node_id, name.as_deref(), path.as_deref(), None)
                .await?;
            output(
                &NodeOutput {
                    action: "moved",
                    node: outcome.node,
                    old_full_path: Some(outcome.old_full_path),
                    descendants_moved: Some(outcome.descendants_moved),
                },
                json_mode,
            );
        }
        WorkspaceCommands::Rm { node_id } => {
            let removed_ids = ctx.workspace.remove(node_id, None).await?;
            output(&RemovedOutput { removed_ids }, json_mode);
        }
        WorkspaceCommands::Ls { team_id } => {
            let files = ctx.workspace.list(team_id).await?;
            output(&ListingOutput { files }, json_mode);
        }
    }
    Ok(())
}
