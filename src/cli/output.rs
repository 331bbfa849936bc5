//! Output formatting utilities for the CLI.

use comfy_table::{presets, Attribute, Cell, ContentArrangement, Table};
use console::style;
use serde::Serialize;

use crate::domain::models::{MemberRole, Team, TreeNode};

/// Unicode box-drawing characters for tree visualization
const TREE_BRANCH: &str = "├── ";
const TREE_LAST: &str = "└── ";
const TREE_PIPE: &str = "│   ";
const TREE_SPACE: &str = "    ";

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Truncate a string to at most `max_len` characters, appending "..." if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// First eight characters of a UUID.
pub fn short_id(id: &uuid::Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// Render a workspace forest with box-drawing connectors.
///
/// Folders are suffixed with `/`; `styled` adds terminal colors.
pub fn render_tree(roots: &[TreeNode], styled: bool) -> String {
    let mut out = String::new();
    render_level(roots, "", styled, &mut out);
    out
}

fn render_level(nodes: &[TreeNode], prefix: &str, styled: bool, out: &mut String) {
    for (i, tree) in nodes.iter().enumerate() {
        let is_last = i + 1 == nodes.len();
        let connector = if is_last { TREE_LAST } else { TREE_BRANCH };
        let label = if tree.node.is_folder() {
            let name = format!("{}/", tree.node.filename);
            if styled {
                style(name).blue().bold().to_string()
            } else {
                name
            }
        } else {
            tree.node.filename.clone()
        };
        out.push_str(prefix);
        out.push_str(connector);
        out.push_str(&label);
        out.push('\n');

        if !tree.children.is_empty() {
            let child_prefix = format!("{prefix}{}", if is_last { TREE_SPACE } else { TREE_PIPE });
            render_level(&tree.children, &child_prefix, styled, out);
        }
    }
}

/// Member table for a team, leader first.
pub fn team_table(team: &Team) -> String {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("Member").add_attribute(Attribute::Bold),
            Cell::new("Role").add_attribute(Attribute::Bold),
        ]);

    for (i, member) in team.members.iter().enumerate() {
        let role = match member.role {
            MemberRole::Leader => "leader",
            MemberRole::Member => "member",
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(member.user_id),
            Cell::new(role),
        ]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{build_tree, WorkspaceNode};
    use uuid::Uuid;

    #[test]
    fn test_render_tree_connectors() {
        let team = Uuid::new_v4();
        let author = Uuid::new_v4();
        let nodes = vec![
            WorkspaceNode::folder(team, author, "", "src"),
            WorkspaceNode::file(team, author, "src", "main.py", None, ""),
            WorkspaceNode::file(team, author, "src", "util.py", None, ""),
            WorkspaceNode::file(team, author, "", "README.md", None, ""),
        ];

        let rendered = render_tree(&build_tree(nodes), false);
        assert_eq!(
            rendered,
            "├── README.md\n└── src/\n    ├── main.py\n    └── util.py\n"
        );
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééééééé", 6), "ééé...");
    }
}
