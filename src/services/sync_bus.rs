//! Realtime sync bus.
//!
//! Team-scoped fan-out of two events over a [`ChannelProvider`]:
//! `directory:update` after a hierarchy mutation, carrying the full refreshed
//! listing, and `code:change` for live edits of an open file. Broadcasting is
//! best effort and never fails the caller.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::models::{RealtimeConfig, WorkspaceNode};
use crate::domain::ports::{
    ChannelError, ChannelKey, ChannelMessage, ChannelProvider, ClientId, ClientInbox,
};

/// Event name for hierarchy mutations.
pub const DIRECTORY_UPDATE: &str = "directory:update";
/// Event name for live buffer edits.
pub const CODE_CHANGE: &str = "code:change";

/// What happened to the subject node of a `directory:update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DirectoryAction {
    Created,
    #[serde(rename_all = "camelCase")]
    Renamed { old_path: String, new_path: String },
    #[serde(rename_all = "camelCase")]
    Deleted { removed_ids: Vec<Uuid> },
}

impl DirectoryAction {
    /// Past-tense verb sent to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Renamed { .. } => "renamed",
            Self::Deleted { .. } => "deleted",
        }
    }
}

/// Payload of `directory:update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUpdate {
    /// Every node of the team after the mutation, ordered by (path, filename)
    pub files: Vec<WorkspaceNode>,
    /// Node the mutation was applied to
    pub subject_id: Uuid,
    #[serde(flatten)]
    pub action: DirectoryAction,
}

/// Payload of `code:change`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeChange {
    /// File being edited
    pub file_id: Uuid,
    /// Whole buffer contents after the edit
    pub content: String,
    /// Profile that made the edit
    pub author_id: Uuid,
}

/// A decoded sync event.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    DirectoryUpdate(DirectoryUpdate),
    CodeChange(CodeChange),
}

impl SyncEvent {
    /// Wire event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DirectoryUpdate(_) => DIRECTORY_UPDATE,
            Self::CodeChange(_) => CODE_CHANGE,
        }
    }

    /// Serialize the event body.
    pub fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::DirectoryUpdate(update) => serde_json::to_value(update),
            Self::CodeChange(change) => serde_json::to_value(change),
        }
    }

    /// Decode a channel message. Unknown event names yield `None`.
    pub fn from_message(message: &ChannelMessage) -> Option<Result<Self, serde_json::Error>> {
        let payload = message.payload.clone();
        match message.event.as_str() {
            DIRECTORY_UPDATE => Some(serde_json::from_value(payload).map(Self::DirectoryUpdate)),
            CODE_CHANGE => Some(serde_json::from_value(payload).map(Self::CodeChange)),
            _ => None,
        }
    }
}

/// Team and file channel fan-out for workspace clients.
pub struct SyncBus {
    channels: Arc<dyn ChannelProvider>,
    scope_code_changes_to_file: bool,
}

impl SyncBus {
    /// Create a bus over a channel provider.
    pub fn new(channels: Arc<dyn ChannelProvider>, config: &RealtimeConfig) -> Self {
        Self {
            channels,
            scope_code_changes_to_file: config.scope_code_changes_to_file,
        }
    }

    /// Register a client and hand back its inbox.
    pub fn connect(&self, client: &ClientId) -> Result<ClientInbox, ChannelError> {
        self.channels.connect(client)
    }

    /// Stop all delivery to a client. In-flight mutations are unaffected.
    pub fn disconnect(&self, client: &ClientId) {
        self.channels.disconnect(client);
    }

    /// Subscribe a client to the team channel.
    pub fn join_team(&self, team_id: Uuid, client: &ClientId) -> Result<(), ChannelError> {
        self.channels.join(&ChannelKey::team(team_id), client)
    }

    /// Leave the team channel and every file sub-room of that team.
    pub fn leave_team(&self, team_id: Uuid, client: &ClientId) -> bool {
        for key in self.channels.rooms_of(client) {
            if key.is_file_room() && key.team_id() == Some(team_id) {
                self.channels.leave(&key, client);
            }
        }
        self.channels.leave(&ChannelKey::team(team_id), client)
    }

    /// Join the file sub-room. Requires membership of the team channel.
    pub fn open_file(&self, team_id: Uuid, file_id: Uuid, client: &ClientId) -> Result<(), ChannelError> {
        if !self.is_team_member(team_id, client) {
            return Err(ChannelError::NotConnected(client.clone()));
        }
        self.channels.join(&ChannelKey::file(team_id, file_id), client)
    }

    /// Leave the file sub-room.
    pub fn close_file(&self, team_id: Uuid, file_id: Uuid, client: &ClientId) -> bool {
        self.channels.leave(&ChannelKey::file(team_id, file_id), client)
    }

    /// Clients currently in the team channel.
    pub fn team_members(&self, team_id: Uuid) -> Vec<ClientId> {
        self.channels.members(&ChannelKey::team(team_id))
    }

    fn is_team_member(&self, team_id: Uuid, client: &ClientId) -> bool {
        self.team_members(team_id).contains(client)
    }

    /// Fan a hierarchy mutation out to the team, skipping the originating client.
    pub fn publish_directory_update(
        &self,
        team_id: Uuid,
        update: DirectoryUpdate,
        origin: Option<&ClientId>,
    ) -> usize {
        let action = update.action.as_str();
        let subject_id = update.subject_id;
        let delivered = self.emit(
            &ChannelKey::team(team_id),
            &SyncEvent::DirectoryUpdate(update),
            origin,
        );
        debug!(team_id = %team_id, %subject_id, action, delivered, "directory update broadcast");
        delivered
    }

    /// Relay a live edit. Nothing is persisted on this path.
    ///
    /// Senders outside the team channel are ignored so edits cannot leak
    /// across teams.
    pub fn publish_code_change(&self, team_id: Uuid, change: CodeChange, origin: &ClientId) -> usize {
        if !self.is_team_member(team_id, origin) {
            warn!(team_id = %team_id, client = %origin, "code change from client outside team channel ignored");
            return 0;
        }
        let key = if self.scope_code_changes_to_file {
            let key = ChannelKey::file(team_id, change.file_id);
            self.evict_non_members(team_id, &key);
            key
        } else {
            ChannelKey::team(team_id)
        };
        self.emit(&key, &SyncEvent::CodeChange(change), Some(origin))
    }

    /// Drop file-room subscribers that are no longer on the team channel.
    fn evict_non_members(&self, team_id: Uuid, key: &ChannelKey) {
        let members = self.team_members(team_id);
        for client in self.channels.members(key) {
            if !members.contains(&client) {
                warn!(team_id = %team_id, client = %client, channel = %key, "evicting stale file room subscriber");
                self.channels.leave(key, &client);
            }
        }
    }

    fn emit(&self, key: &ChannelKey, event: &SyncEvent, origin: Option<&ClientId>) -> usize {
        match event.to_payload() {
            Ok(payload) => self.channels.broadcast(key, event.name(), payload, origin),
            Err(e) => {
                warn!(channel = %key, event = event.name(), error = %e, "failed to encode sync event");
                0
            }
        }
    }
}
