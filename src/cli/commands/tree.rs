//! `teamspace tree <team>`: render a team workspace.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use uuid::Uuid;

use crate::cli::context::AppContext;
use crate::cli::output::{output, render_tree, CommandOutput};
use crate::domain::models::TreeNode;

#[derive(Args, Debug)]
pub struct TreeArgs {
    pub team_id: Uuid,

    /// Disable colors
    #[arg(long)]
    pub plain: bool,
}

#[derive(Debug, Serialize)]
pub struct TreeOutput {
    pub team_id: Uuid,
    pub nodes: usize,
    pub tree: Vec<TreeNode>,
    #[serde(skip)]
    styled: bool,
}

impl CommandOutput for TreeOutput {
    fn to_human(&self) -> String {
        if self.tree.is_empty() {
            return format!("Workspace of team {} is empty.", self.team_id);
        }
        format!(
            ".\n{}\n{} node(s)",
            render_tree(&self.tree, self.styled).trim_end(),
            self.nodes
        )
    }
}

pub async fn execute(args: TreeArgs, json_mode: bool) -> Result<()> {
    let ctx = AppContext::load().await?;
    let tree = ctx.workspace.tree(args.team_id).await?;
    let nodes = tree.iter().map(TreeNode::size).sum();
    output(
        &TreeOutput {
            team_id: args.team_id,
            nodes,
            tree,
            styled: !args.plain && console::colors_enabled(),
        },
        json_mode,
    );
    Ok(())
}
