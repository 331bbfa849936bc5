//! Virtual file hierarchy service.
//!
//! Nodes live in a flat per-team collection addressed by `(path, filename)`.
//! All mutations of one team run under that team's lock, so a rename and a
//! delete on overlapping subtrees cannot interleave. Each successful
//! mutation publishes a `directory:update` and a `WorkspaceMutated` event;
//! publication problems are logged and never fail the mutation.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::event_bus::{EventBus, EventPayload, WorkspaceChange};
use super::keyed_lock::KeyedLock;
use super::sync_bus::{DirectoryAction, DirectoryUpdate, SyncBus};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::workspace::{
    is_within, join_path, normalize_path, split_full_path, validate_filename,
};
use crate::domain::models::{build_tree, NodeType, TreeNode, WorkspaceNode};
use crate::domain::ports::{ClientId, WorkspaceRepository};

/// Request to create a node or save a file.
#[derive(Debug, Clone)]
pub struct UpsertNode {
    /// Team that owns the workspace
    pub team_id: Uuid,
    /// Actor stamped on the node
    pub author_id: Uuid,
    /// Parent folder's full path, "" for the root
    pub path: String,
    /// Node name inside the parent
    pub filename: String,
    /// File or folder
    pub node_type: NodeType,
    /// Editor language hint, files only
    pub language: Option<String>,
    /// New content, files only
    pub content: Option<String>,
}

impl UpsertNode {
    /// Request to create or save a file.
    pub fn file(team_id: Uuid, author_id: Uuid, path: &str, filename: &str, content: &str) -> Self {
        Self {
            team_id,
            author_id,
            path: path.to_string(),
            filename: filename.to_string(),
            node_type: NodeType::File,
            language: None,
            content: Some(content.to_string()),
        }
    }

    /// Request to create a folder.
    pub fn folder(team_id: Uuid, author_id: Uuid, path: &str, filename: &str) -> Self {
        Self {
            team_id,
            author_id,
            path: path.to_string(),
            filename: filename.to_string(),
            node_type: NodeType::Folder,
            language: None,
            content: None,
        }
    }

    /// Set the language hint.
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }
}

/// Result of an upsert.
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    /// Node as stored after the upsert
    pub node: WorkspaceNode,
    /// False when an existing node was updated (or a folder already existed)
    pub created: bool,
}

/// Result of a rename or move.
#[derive(Debug, Clone)]
pub struct RenameOutcome {
    /// Node at its new address
    pub node: WorkspaceNode,
    /// Full path before the move
    pub old_full_path: String,
    /// Descendants whose path prefix was rewritten
    pub descendants_moved: u64,
}

/// Service for the per-team virtual file hierarchy.
pub struct WorkspaceService<R: WorkspaceRepository> {
    repository: Arc<R>,
    team_locks: KeyedLock<Uuid>,
    sync: Option<Arc<SyncBus>>,
    events: Option<Arc<EventBus>>,
}

impl<R: WorkspaceRepository> WorkspaceService<R> {
    /// Create a service over a workspace repository.
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            team_locks: KeyedLock::new(),
            sync: None,
            events: None,
        }
    }

    /// Broadcast `directory:update` on this bus after each mutation.
    pub fn with_sync_bus(mut self, sync: Arc<SyncBus>) -> Self {
        self.sync = Some(sync);
        self
    }

    /// Publish `WorkspaceMutated` events on this bus.
    pub fn with_event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Create a node, or update an existing file's content and metadata.
    #[instrument(skip(self, request, origin), fields(team_id = %request.team_id, filename = %request.filename))]
    pub async fn upsert(&self, request: UpsertNode, origin: Option<&ClientId>) -> DomainResult<UpsertOutcome> {
        let path = normalize_path(&request.path)?;
        validate_filename(&request.filename)?;
        let team_id = request.team_id;

        let _guard = self.team_locks.lock(&team_id).await;

        self.require_parent_folder(team_id, &path).await?;

        if let Some(mut existing) = self.repository.find_by_path(team_id, &path, &request.filename).await? {
            if existing.node_type != request.node_type {
                return Err(DomainError::PathConflict {
                    team_id,
                    full_path: existing.full_path(),
                });
            }
            if existing.is_folder() {
                return Ok(UpsertOutcome {
                    node: existing,
                    created: false,
                });
            }

            if let Some(content) = request.content {
                existing.content = content;
            }
            if request.language.is_some() {
                existing.language = request.language;
            }
            existing.author_id = request.author_id;
            existing.updated_at = chrono::Utc::now();
            self.repository.update_content(&existing).await?;

            debug!(node_id = %existing.id, "file saved");
            self.publish_event(EventPayload::WorkspaceMutated {
                team_id,
                change: WorkspaceChange::Updated,
                node_ids: vec![existing.id],
            });
            return Ok(UpsertOutcome {
                node: existing,
                created: false,
            });
        }

        let node = match request.node_type {
            NodeType::File => WorkspaceNode::file(
                team_id,
                request.author_id,
                path,
                request.filename,
                request.language,
                request.content.unwrap_or_default(),
            ),
            NodeType::Folder => WorkspaceNode::folder(team_id, request.author_id, path, request.filename),
        };
        self.repository.insert(&node).await?;

        info!(node_id = %node.id, full_path = %node.full_path(), node_type = node.node_type.as_str(), "node created");
        self.publish_directory_update(team_id, node.id, DirectoryAction::Created, origin)
            .await;
        self.publish_event(EventPayload::WorkspaceMutated {
            team_id,
            change: WorkspaceChange::Created,
            node_ids: vec![node.id],
        });

        Ok(UpsertOutcome { node, created: true })
    }

    /// Rename and/or move a node. Folder descendants follow in one transaction.
    #[instrument(skip(self, new_filename, new_path, origin))]
    pub async fn rename(
        &self,
        node_id: Uuid,
        new_filename: Option<&str>,
        new_path: Option<&str>,
        origin: Option<&ClientId>,
    ) -> DomainResult<RenameOutcome> {
        let team_id = self.require_node(node_id).await?.team_id;
        let _guard = self.team_locks.lock(&team_id).await;
        // Re-read under the lock; a concurrent mutation may have moved or removed it
        let mut node = self.require_node(node_id).await?;

        let filename = match new_filename {
            Some(name) => {
                validate_filename(name)?;
                name.to_string()
            }
            None => node.filename.clone(),
        };
        let path = match new_path {
            Some(p) => normalize_path(p)?,
            None => node.path.clone(),
        };

        let old_full = node.full_path();
        let new_full = join_path(&path, &filename);
        if old_full == new_full {
            return Ok(RenameOutcome {
                node,
                old_full_path: old_full,
                descendants_moved: 0,
            });
        }

        if node.is_folder() && is_within(&new_full, &old_full) {
            return Err(DomainError::ValidationFailed(format!(
                "cannot move folder '{old_full}' into its own subtree '{new_full}'"
            )));
        }
        self.require_parent_folder(team_id, &path).await?;
        if self.repository.find_by_path(team_id, &path, &filename).await?.is_some() {
            return Err(DomainError::PathConflict {
                team_id,
                full_path: new_full,
            });
        }

        node.filename = filename;
        node.path = path;
        node.updated_at = chrono::Utc::now();
        let descendants_moved = self.repository.relocate(&node, &old_full, &new_full).await?;

        info!(node_id = %node.id, from = %old_full, to = %new_full, descendants_moved, "node renamed");
        self.publish_directory_update(
            team_id,
            node.id,
            DirectoryAction::Renamed {
                old_path: old_full.clone(),
                new_path: new_full,
            },
            origin,
        )
        .await;
        self.publish_event(EventPayload::WorkspaceMutated {
            team_id,
            change: WorkspaceChange::Renamed,
            node_ids: vec![node.id],
        });

        Ok(RenameOutcome {
            node,
            old_full_path: old_full,
            descendants_moved,
        })
    }

    /// Delete a node.
    ///
    /// A folder goes with its whole subtree. A file goes alone, and its parent
    /// folder follows when nothing else is left in it; pruning climbs one
    /// level per call.
    ///
    /// Returns the ids of every node removed.
    #[instrument(skip(self, origin))]
    pub async fn remove(&self, node_id: Uuid, origin: Option<&ClientId>) -> DomainResult<Vec<Uuid>> {
        let team_id = self.require_node(node_id).await?.team_id;
        let _guard = self.team_locks.lock(&team_id).await;
        let node = self.require_node(node_id).await?;

        let removed = if node.is_folder() {
            self.repository.delete_subtree(&node).await?
        } else {
            let removed = self.repository.delete_file(&node).await?;
            if let Some(parent_id) = removed.get(1) {
                debug!(folder_id = %parent_id, full_path = %node.path, "pruned empty folder");
            }
            removed
        };

        info!(node_id = %node.id, full_path = %node.full_path(), removed = removed.len(), "node removed");
        self.publish_directory_update(
            team_id,
            node.id,
            DirectoryAction::Deleted {
                removed_ids: removed.clone(),
            },
            origin,
        )
        .await;
        self.publish_event(EventPayload::WorkspaceMutated {
            team_id,
            change: WorkspaceChange::Removed,
            node_ids: removed.clone(),
        });

        Ok(removed)
    }

    /// Get a node by id.
    pub async fn get(&self, node_id: Uuid) -> DomainResult<WorkspaceNode> {
        self.require_node(node_id).await
    }

    /// Flat listing ordered by (path, filename).
    pub async fn list(&self, team_id: Uuid) -> DomainResult<Vec<WorkspaceNode>> {
        self.repository.list_by_team(team_id).await
    }

    /// Nested tree reconstructed from the flat listing.
    pub async fn tree(&self, team_id: Uuid) -> DomainResult<Vec<TreeNode>> {
        Ok(build_tree(self.repository.list_by_team(team_id).await?))
    }

    async fn require_node(&self, node_id: Uuid) -> DomainResult<WorkspaceNode> {
        self.repository
            .get(node_id)
            .await?
            .ok_or(DomainError::NodeNotFound(node_id))
    }

    /// A non-root `path` must be the full path of an existing folder.
    async fn require_parent_folder(&self, team_id: Uuid, path: &str) -> DomainResult<()> {
        if path.is_empty() {
            return Ok(());
        }
        let (parent_path, parent_name) = split_full_path(path);
        match self.repository.find_by_path(team_id, parent_path, parent_name).await? {
            Some(parent) if parent.is_folder() => Ok(()),
            Some(_) => Err(DomainError::ValidationFailed(format!(
                "parent '{path}' is a file, not a folder"
            ))),
            None => Err(DomainError::ValidationFailed(format!(
                "parent folder '{path}' does not exist"
            ))),
        }
    }

    async fn publish_directory_update(
        &self,
        team_id: Uuid,
        subject_id: Uuid,
        action: DirectoryAction,
        origin: Option<&ClientId>,
    ) {
        let Some(sync) = &self.sync else {
            return;
        };
        match self.repository.list_by_team(team_id).await {
            Ok(files) => {
                sync.publish_directory_update(
                    team_id,
                    DirectoryUpdate {
                        files,
                        subject_id,
                        action,
                    },
                    origin,
                );
            }
            Err(e) => {
                warn!(team_id = %team_id, error = %e, "could not load listing for directory update");
            }
        }
    }

    fn publish_event(&self, payload: EventPayload) {
        if let Some(events) = &self.events {
            events.publish(payload);
        }
    }
}
