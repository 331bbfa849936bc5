//! Client-side mirror of a team workspace.
//!
//! Consumes sync bus messages the way an editor client would: a
//! `directory:update` replaces the cached listing wholesale, and a
//! `code:change` is applied to the in-memory buffer of a file only when that
//! file is open. Open buffers survive renames; they are dropped only when their
//! file disappears from the listing.

use std::collections::HashMap;

use tracing::{debug, warn};
use uuid::Uuid;

use super::sync_bus::{DirectoryAction, SyncEvent};
use crate::domain::models::{build_tree, TreeNode, WorkspaceNode};
use crate::domain::ports::{ChannelMessage, ClientInbox};

/// Effect of applying one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorChange {
    /// Listing replaced; lists editors closed because their file vanished
    ListingReplaced { action: &'static str, closed: Vec<Uuid> },
    /// An open buffer received new content
    BufferUpdated(Uuid),
    /// Message was for another team, a closed file, or unknown
    Ignored,
}

/// Client-side copy of a team workspace and its open buffers.
#[derive(Debug, Clone)]
pub struct WorkspaceMirror {
    team_id: Uuid,
    listing: Vec<WorkspaceNode>,
    buffers: HashMap<Uuid, String>,
}

impl WorkspaceMirror {
    /// Start from a fetched listing.
    pub fn new(team_id: Uuid, listing: Vec<WorkspaceNode>) -> Self {
        Self {
            team_id,
            listing,
            buffers: HashMap::new(),
        }
    }

    pub fn listing(&self) -> &[WorkspaceNode] {
        &self.listing
    }

    pub fn tree(&self) -> Vec<TreeNode> {
        build_tree(self.listing.clone())
    }

    /// Look up a node by full path.
    pub fn find(&self, full_path: &str) -> Option<&WorkspaceNode> {
        self.listing.iter().find(|n| n.full_path() == full_path)
    }

    /// Open a file from the current listing into an editor buffer.
    pub fn open(&mut self, file_id: Uuid) -> bool {
        let Some(node) = self.listing.iter().find(|n| n.id == file_id && !n.is_folder()) else {
            return false;
        };
        self.buffers.entry(file_id).or_insert_with(|| node.content.clone());
        true
    }

    /// Close a buffer.
    pub fn close(&mut self, file_id: Uuid) -> bool {
        self.buffers.remove(&file_id).is_some()
    }

    pub fn buffer(&self, file_id: Uuid) -> Option<&str> {
        self.buffers.get(&file_id).map(String::as_str)
    }

    pub fn is_open(&self, file_id: Uuid) -> bool {
        self.buffers.contains_key(&file_id)
    }

    /// Replace the listing after an explicit reload.
    pub fn reload(&mut self, listing: Vec<WorkspaceNode>) {
        self.listing = listing;
    }

    /// Apply one sync message to the mirror.
    pub fn apply(&mut self, message: &ChannelMessage) -> MirrorChange {
        if message.channel.team_id() != Some(self.team_id) {
            return MirrorChange::Ignored;
        }

        let event = match SyncEvent::from_message(message) {
            Some(Ok(event)) => event,
            Some(Err(e)) => {
                warn!(event = %message.event, error = %e, "malformed sync payload");
                return MirrorChange::Ignored;
            }
            None => return MirrorChange::Ignored,
        };

        match event {
            SyncEvent::DirectoryUpdate(update) => {
                self.listing = update.files;
                let mut closed: Vec<Uuid> = self
                    .buffers
                    .keys()
                    .filter(|id| !self.listing.iter().any(|n| n.id == **id))
                    .copied()
                    .collect();
                closed.sort();
                for id in &closed {
                    self.buffers.remove(id);
                }
                if let DirectoryAction::Deleted { removed_ids } = &update.action {
                    debug!(removed = removed_ids.len(), "mirror applied deletion");
                }
                MirrorChange::ListingReplaced {
                    action: update.action.as_str(),
                    closed,
                }
            }
            SyncEvent::CodeChange(change) => match self.buffers.get_mut(&change.file_id) {
                Some(buffer) => {
                    *buffer = change.content;
                    MirrorChange::BufferUpdated(change.file_id)
                }
                None => MirrorChange::Ignored,
            },
        }
    }

    /// Apply every message already waiting in the inbox.
    pub fn drain(&mut self, inbox: &mut ClientInbox) -> Vec<MirrorChange> {
        let mut changes = Vec::new();
        while let Ok(message) = inbox.try_recv() {
            changes.push(self.apply(&message));
        }
        changes
    }
}
