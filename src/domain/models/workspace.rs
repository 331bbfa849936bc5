//! Workspace hierarchy domain model.
//!
//! A team workspace is a flat arena of nodes keyed by id. The hierarchy is
//! encoded in each node's `path` (the slash-joined chain of ancestor folder
//! names, `""` at the root). Everything that reasons about paths goes through
//! the helpers in this module so prefix matching is always anchored on a
//! segment boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

/// Kind of workspace node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    File,
    Folder,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "file" => Some(Self::File),
            "folder" => Some(Self::Folder),
            _ => None,
        }
    }
}

/// A file or folder inside a team workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceNode {
    pub id: Uuid,
    pub team_id: Uuid,
    /// Last actor that created or saved this node
    pub author_id: Uuid,
    pub filename: String,
    /// Full path of the parent folder, `""` for the root
    pub path: String,
    pub node_type: NodeType,
    /// Editor language (files only)
    pub language: Option<String>,
    /// File body, always empty for folders
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkspaceNode {
    /// Create a new file node.
    pub fn file(
        team_id: Uuid,
        author_id: Uuid,
        path: impl Into<String>,
        filename: impl Into<String>,
        language: Option<String>,
        content: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            team_id,
            author_id,
            filename: filename.into(),
            path: path.into(),
            node_type: NodeType::File,
            language,
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new folder node.
    pub fn folder(
        team_id: Uuid,
        author_id: Uuid,
        path: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            team_id,
            author_id,
            filename: filename.into(),
            path: path.into(),
            node_type: NodeType::Folder,
            language: None,
            content: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.node_type == NodeType::Folder
    }

    /// Full path of this node (`path/filename`, or just `filename` at the root).
    pub fn full_path(&self) -> String {
        join_path(&self.path, &self.filename)
    }
}

/// Join a parent path and a name into a full path.
pub fn join_path(path: &str, filename: &str) -> String {
    if path.is_empty() {
        filename.to_string()
    } else {
        format!("{path}/{filename}")
    }
}

/// Split a full path into `(parent_path, filename)`.
pub fn split_full_path(full_path: &str) -> (&str, &str) {
    match full_path.rsplit_once('/') {
        Some((parent, name)) => (parent, name),
        None => ("", full_path),
    }
}

/// True when `path` is `prefix` itself or lies underneath it.
///
/// `"abc"` is within `"abc"` and `"abc/d"`'s ancestry, never within `"abcdef"`.
pub fn is_within(path: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    path == prefix
        || (path.len() > prefix.len()
            && path.starts_with(prefix)
            && path.as_bytes()[prefix.len()] == b'/')
}

/// Rewrite the `old_prefix` part of `path` to `new_prefix`, keeping the remainder.
///
/// Returns `None` when `path` is not within `old_prefix`.
pub fn rewrite_prefix(path: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    if !is_within(path, old_prefix) {
        return None;
    }
    let remainder = if old_prefix.is_empty() {
        path
    } else {
        path[old_prefix.len()..].trim_start_matches('/')
    };
    Some(match (new_prefix.is_empty(), remainder.is_empty()) {
        (_, true) => new_prefix.to_string(),
        (true, false) => remainder.to_string(),
        (false, false) => format!("{new_prefix}/{remainder}"),
    })
}

/// Validate a single node name.
pub fn validate_filename(filename: &str) -> DomainResult<()> {
    if filename.trim().is_empty() {
        return Err(DomainError::ValidationFailed(
            "filename cannot be empty".to_string(),
        ));
    }
    if filename.contains('/') {
        return Err(DomainError::ValidationFailed(format!(
            "filename cannot contain '/': {filename}"
        )));
    }
    if filename == "." || filename == ".." {
        return Err(DomainError::ValidationFailed(format!(
            "filename cannot be '{filename}'"
        )));
    }
    Ok(())
}

/// Normalize a parent path: strip surrounding slashes and validate each segment.
pub fn normalize_path(path: &str) -> DomainResult<String> {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    for segment in trimmed.split('/') {
        validate_filename(segment).map_err(|_| {
            DomainError::ValidationFailed(format!("invalid path segment in '{path}'"))
        })?;
    }
    Ok(trimmed.to_string())
}

/// A node together with its reconstructed children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub node: WorkspaceNode,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of nodes in this subtree, including itself.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }
}

/// Reconstruct a forest from a flat set of nodes.
///
/// Nodes are grouped by `path`; the forest starts at the empty root path and
/// each folder adopts the group whose `path` equals its full path. Siblings are
/// ordered by `(path, filename)`. Nodes whose parent folder is missing are not
/// reachable and are left out.
pub fn build_tree(nodes: Vec<WorkspaceNode>) -> Vec<TreeNode> {
    let mut groups: BTreeMap<String, Vec<WorkspaceNode>> = BTreeMap::new();
    for node in nodes {
        groups.entry(node.path.clone()).or_default().push(node);
    }
    for siblings in groups.values_mut() {
        siblings.sort_by(|a, b| (&a.path, &a.filename).cmp(&(&b.path, &b.filename)));
    }
    attach_children("", &mut groups)
}

fn attach_children(parent: &str, groups: &mut BTreeMap<String, Vec<WorkspaceNode>>) -> Vec<TreeNode> {
    let Some(siblings) = groups.remove(parent) else {
        return Vec::new();
    };
    siblings
        .into_iter()
        .map(|node| {
            let children = if node.is_folder() {
                attach_children(&node.full_path(), groups)
            } else {
                Vec::new()
            };
            TreeNode { node, children }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(team: Uuid, path: &str, name: &str) -> WorkspaceNode {
        WorkspaceNode::folder(team, Uuid::new_v4(), path, name)
    }

    fn file(team: Uuid, path: &str, name: &str) -> WorkspaceNode {
        WorkspaceNode::file(team, Uuid::new_v4(), path, name, None, "")
    }

    #[test]
    fn test_full_path_at_root_and_nested() {
        let team = Uuid::new_v4();
        assert_eq!(file(team, "", "main.py").full_path(), "main.py");
        assert_eq!(file(team, "src/lib", "util.py").full_path(), "src/lib/util.py");
    }

    #[test]
    fn test_is_within_is_boundary_anchored() {
        assert!(is_within("abc", "abc"));
        assert!(is_within("abc/def", "abc"));
        assert!(!is_within("abcdef", "abc"));
        assert!(!is_within("ab", "abc"));
        assert!(is_within("anything", ""));
    }

    #[test]
    fn test_rewrite_prefix() {
        assert_eq!(rewrite_prefix("a", "a", "b").as_deref(), Some("b"));
        assert_eq!(rewrite_prefix("a/y", "a", "b/c").as_deref(), Some("b/c/y"));
        assert_eq!(rewrite_prefix("a/y", "a", "").as_deref(), Some("y"));
        assert_eq!(rewrite_prefix("ab/y", "a", "b"), None);
    }

    #[test]
    fn test_split_full_path() {
        assert_eq!(split_full_path("src/lib"), ("src", "lib"));
        assert_eq!(split_full_path("docs"), ("", "docs"));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/src/lib/").unwrap(), "src/lib");
        assert_eq!(normalize_path("").unwrap(), "");
        assert!(normalize_path("src//lib").is_err());
        assert!(normalize_path("src/../etc").is_err());
    }

    #[test]
    fn test_validate_filename() {
        assert!(validate_filename("main.rs").is_ok());
        assert!(validate_filename("").is_err());
        assert!(validate_filename("a/b").is_err());
        assert!(validate_filename("..").is_err());
    }

    #[test]
    fn test_build_tree_nests_and_orders() {
        let team = Uuid::new_v4();
        let nodes = vec![
            file(team, "src", "main.py"),
            folder(team, "", "src"),
            file(team, "", "README.md"),
            file(team, "src", "app.py"),
            folder(team, "src", "lib"),
            file(team, "src/lib", "util.py"),
        ];

        let tree = build_tree(nodes);
        let names: Vec<_> = tree.iter().map(|t| t.node.filename.as_str()).collect();
        assert_eq!(names, vec!["README.md", "src"]);

        let src = &tree[1];
        let children: Vec<_> = src.children.iter().map(|t| t.node.filename.as_str()).collect();
        assert_eq!(children, vec!["app.py", "lib", "main.py"]);
        assert_eq!(src.children[1].children[0].node.filename, "util.py");
        assert_eq!(tree.iter().map(TreeNode::size).sum::<usize>(), 6);
    }

    #[test]
    fn test_build_tree_skips_false_prefix_siblings() {
        let team = Uuid::new_v4();
        let nodes = vec![
            folder(team, "", "abc"),
            folder(team, "", "abcdef"),
            file(team, "abcdef", "x.txt"),
        ];
        let tree = build_tree(nodes);
        assert!(tree[0].children.is_empty());
        assert_eq!(tree[1].children.len(), 1);
    }
}
