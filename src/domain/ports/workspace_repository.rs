//! Workspace node repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::WorkspaceNode;

/// Repository interface for workspace node persistence.
///
/// Prefix queries take a folder's full path and match nodes whose `path` is
/// that folder or lies beneath it, anchored on a `/` boundary.
#[async_trait]
pub trait WorkspaceRepository: Send + Sync {
    /// Insert a new node. Fails with `PathConflict` when (team, path, filename) is taken.
    async fn insert(&self, node: &WorkspaceNode) -> DomainResult<()>;

    /// Persist the mutable fields of a file (content, language, author).
    async fn update_content(&self, node: &WorkspaceNode) -> DomainResult<()>;

    /// Get a node by ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<WorkspaceNode>>;

    /// Find a node by its address inside a team.
    async fn find_by_path(
        &self,
        team_id: Uuid,
        path: &str,
        filename: &str,
    ) -> DomainResult<Option<WorkspaceNode>>;

    /// All nodes of a team, ordered by (path, filename).
    async fn list_by_team(&self, team_id: Uuid) -> DomainResult<Vec<WorkspaceNode>>;

    /// Save a renamed/moved node and rewrite the `old_full` prefix of every
    /// descendant path to `new_full`, all in one transaction.
    ///
    /// Returns the number of descendants rewritten.
    async fn relocate(&self, node: &WorkspaceNode, old_full: &str, new_full: &str) -> DomainResult<u64>;

    /// Delete a node and every node whose `path` lies within `full_path`, in one
    /// transaction. Returns the ids removed.
    async fn delete_subtree(&self, node: &WorkspaceNode) -> DomainResult<Vec<Uuid>>;

    /// Delete a file and, when that leaves its parent folder empty, the
    /// parent too, in one transaction. Returns the ids removed.
    async fn delete_file(&self, node: &WorkspaceNode) -> DomainResult<Vec<Uuid>>;
}
