//! Realtime channel port.
//!
//! A channel is a named room. Clients connect once, receive a single inbox,
//! and join or leave rooms; broadcasts fan out to the current members of a
//! room, optionally skipping the originating client.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Identifier of a connected client (one per socket/session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Namespaced room key: `team:{team_id}` or `team:{team_id}:file:{file_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelKey(String);

impl ChannelKey {
    /// Room shared by every member of a team.
    pub fn team(team_id: Uuid) -> Self {
        Self(format!("team:{team_id}"))
    }

    /// Room for clients that have a particular file open.
    pub fn file(team_id: Uuid, file_id: Uuid) -> Self {
        Self(format!("team:{team_id}:file:{file_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Team that owns this room, if the key is well formed.
    pub fn team_id(&self) -> Option<Uuid> {
        let rest = self.0.strip_prefix("team:")?;
        let id = rest.split(':').next()?;
        Uuid::parse_str(id).ok()
    }

    pub fn is_file_room(&self) -> bool {
        // "team:" + uuid is 41 bytes; anything longer carries a file suffix
        self.0.len() > 41
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message delivered to a client's inbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// Room the message was broadcast to.
    pub channel: ChannelKey,
    /// Event name, e.g. `directory:update`.
    pub event: String,
    /// Event payload.
    pub payload: serde_json::Value,
    /// Client that caused the broadcast, if any.
    pub origin: Option<ClientId>,
}

/// Receiving end handed to a client on connect.
pub type ClientInbox = mpsc::Receiver<ChannelMessage>;

/// Errors raised by channel providers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Client not connected: {0}")]
    NotConnected(ClientId),

    #[error("Client already connected: {0}")]
    AlreadyConnected(ClientId),
}

/// Room-based pub/sub transport.
///
/// Delivery is best effort: a message for a full or closed inbox is dropped
/// for that client only. Messages broadcast to one room reach each member in
/// broadcast order.
pub trait ChannelProvider: Send + Sync {
    /// Register a client and hand back its inbox.
    fn connect(&self, client: &ClientId) -> Result<ClientInbox, ChannelError>;

    /// Remove a client from every room it joined.
    fn disconnect(&self, client: &ClientId);

    /// Add a connected client to a room. Joining twice is a no-op.
    fn join(&self, key: &ChannelKey, client: &ClientId) -> Result<(), ChannelError>;

    /// Remove a client from a room. Returns false if it was not a member.
    fn leave(&self, key: &ChannelKey, client: &ClientId) -> bool;

    /// Send an event to every member of a room except `except`.
    ///
    /// Returns the number of inboxes the message was queued on.
    fn broadcast(
        &self,
        key: &ChannelKey,
        event: &str,
        payload: serde_json::Value,
        except: Option<&ClientId>,
    ) -> usize;

    /// Current members of a room.
    fn members(&self, key: &ChannelKey) -> Vec<ClientId>;

    /// Rooms a client currently belongs to.
    fn rooms_of(&self, client: &ClientId) -> Vec<ChannelKey>;
}
