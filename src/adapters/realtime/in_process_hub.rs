//! In-process room hub backed by DashMap.
//!
//! Each connected client owns a bounded mpsc inbox. Rooms hold an ordered
//! member list; a broadcast takes the room's entry exclusively so every member
//! sees that room's messages in the same order.

use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::domain::ports::{
    ChannelError, ChannelKey, ChannelMessage, ChannelProvider, ClientId, ClientInbox,
};

/// Default per-client inbox capacity.
pub const DEFAULT_INBOX_CAPACITY: usize = 256;

/// Channel provider backed by in-memory rooms and bounded inboxes.
pub struct InProcessChannelHub {
    clients: DashMap<ClientId, mpsc::Sender<ChannelMessage>>,
    rooms: DashMap<ChannelKey, Vec<ClientId>>,
    inbox_capacity: usize,
}

impl Default for InProcessChannelHub {
    fn default() -> Self {
        Self::new(DEFAULT_INBOX_CAPACITY)
    }
}

impl InProcessChannelHub {
    /// Hub whose client inboxes hold `inbox_capacity` messages.
    pub fn new(inbox_capacity: usize) -> Self {
        Self {
            clients: DashMap::new(),
            rooms: DashMap::new(),
            inbox_capacity: inbox_capacity.max(1),
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl ChannelProvider for InProcessChannelHub {
    fn connect(&self, client: &ClientId) -> Result<ClientInbox, ChannelError> {
        let (tx, rx) = mpsc::channel(self.inbox_capacity);
        match self.clients.entry(client.clone()) {
            dashmap::mapref::entry::Entry::Occupied(mut existing) => {
                // A closed inbox means the previous session went away without disconnecting
                if !existing.get().is_closed() {
                    return Err(ChannelError::AlreadyConnected(client.clone()));
                }
                existing.insert(tx);
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(tx);
            }
        }
        debug!(client = %client, "client connected");
        Ok(rx)
    }

    fn disconnect(&self, client: &ClientId) {
        self.clients.remove(client);
        self.rooms.retain(|_, members| {
            members.retain(|m| m != client);
            !members.is_empty()
        });
        debug!(client = %client, "client disconnected");
    }

    fn join(&self, key: &ChannelKey, client: &ClientId) -> Result<(), ChannelError> {
        if !self.clients.contains_key(client) {
            return Err(ChannelError::NotConnected(client.clone()));
        }
        let mut members = self.rooms.entry(key.clone()).or_default();
        if !members.contains(client) {
            members.push(client.clone());
            debug!(client = %client, channel = %key, "joined channel");
        }
        Ok(())
    }

    fn leave(&self, key: &ChannelKey, client: &ClientId) -> bool {
        let removed = match self.rooms.get_mut(key) {
            Some(mut members) => {
                let before = members.len();
                members.retain(|m| m != client);
                before != members.len()
            }
            None => false,
        };
        self.rooms.remove_if(key, |_, members| members.is_empty());
        if removed {
            debug!(client = %client, channel = %key, "left channel");
        }
        removed
    }

    fn broadcast(
        &self,
        key: &ChannelKey,
        event: &str,
        payload: serde_json::Value,
        except: Option<&ClientId>,
    ) -> usize {
        let Some(members) = self.rooms.get_mut(key) else {
            return 0;
        };

        let message = ChannelMessage {
            channel: key.clone(),
            event: event.to_string(),
            payload,
            origin: except.cloned(),
        };

        let mut delivered = 0;
        let mut gone = Vec::new();
        for member in members.iter().filter(|m| Some(*m) != except) {
            let Some(sender) = self.clients.get(member) else {
                gone.push(member.clone());
                continue;
            };
            match sender.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(client = %member, channel = %key, event, "inbox full, dropping event");
                }
                Err(TrySendError::Closed(_)) => gone.push(member.clone()),
            }
        }
        drop(members);

        for client in gone {
            self.disconnect(&client);
        }
        delivered
    }

    fn members(&self, key: &ChannelKey) -> Vec<ClientId> {
        self.rooms
            .get(key)
            .map(|members| members.clone())
            .unwrap_or_default()
    }

    fn rooms_of(&self, client: &ClientId) -> Vec<ChannelKey> {
        let mut keys: Vec<ChannelKey> = self
            .rooms
            .iter()
            .filter(|room| room.value().contains(client))
            .map(|room| room.key().clone())
            .collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_broadcast_skips_origin() {
        let hub = InProcessChannelHub::default();
        let room = ChannelKey::team(Uuid::new_v4());
        let a = ClientId::from("a");
        let b = ClientId::from("b");
        let mut inbox_a = hub.connect(&a).unwrap();
        let mut inbox_b = hub.connect(&b).unwrap();
        hub.join(&room, &a).unwrap();
        hub.join(&room, &b).unwrap();

        let delivered = hub.broadcast(&room, "directory:update", json!({"n": 1}), Some(&a));
        assert_eq!(delivered, 1);

        let msg = inbox_b.recv().await.unwrap();
        assert_eq!(msg.event, "directory:update");
        assert_eq!(msg.origin, Some(a.clone()));
        assert!(inbox_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_leave_stops_delivery() {
        let hub = InProcessChannelHub::default();
        let room = ChannelKey::file(Uuid::new_v4(), Uuid::new_v4());
        let a = ClientId::from("a");
        let mut inbox = hub.connect(&a).unwrap();
        hub.join(&room, &a).unwrap();

        assert!(hub.leave(&room, &a));
        assert!(!hub.leave(&room, &a));
        assert_eq!(hub.broadcast(&room, "code:change", json!({}), None), 0);
        assert!(inbox.try_recv().is_err());
        assert_eq!(hub.room_count(), 0);
    }

    #[tokio::test]
    async fn test_join_requires_connection_and_is_idempotent() {
        let hub = InProcessChannelHub::default();
        let room = ChannelKey::team(Uuid::new_v4());
        let a = ClientId::from("a");

        assert!(matches!(hub.join(&room, &a), Err(ChannelError::NotConnected(_))));

        let _inbox = hub.connect(&a).unwrap();
        hub.join(&room, &a).unwrap();
        hub.join(&room, &a).unwrap();
        assert_eq!(hub.members(&room), vec![a]);
    }

    #[tokio::test]
    async fn test_dropped_inbox_is_pruned_on_broadcast() {
        let hub = InProcessChannelHub::default();
        let room = ChannelKey::team(Uuid::new_v4());
        let a = ClientId::from("a");
        let inbox = hub.connect(&a).unwrap();
        hub.join(&room, &a).unwrap();
        drop(inbox);

        assert_eq!(hub.broadcast(&room, "directory:update", json!([]), None), 0);
        assert_eq!(hub.client_count(), 0);
        assert!(hub.members(&room).is_empty());
    }

    #[tokio::test]
    async fn test_full_inbox_drops_only_for_that_client() {
        let hub = InProcessChannelHub::new(1);
        let room = ChannelKey::team(Uuid::new_v4());
        let slow = ClientId::from("slow");
        let fast = ClientId::from("fast");
        let _slow_inbox = hub.connect(&slow).unwrap();
        let mut fast_inbox = hub.connect(&fast).unwrap();
        hub.join(&room, &slow).unwrap();
        hub.join(&room, &fast).unwrap();

        assert_eq!(hub.broadcast(&room, "e", json!(1), None), 2);
        fast_inbox.recv().await.unwrap();
        assert_eq!(hub.broadcast(&room, "e", json!(2), None), 1);
        assert_eq!(fast_inbox.recv().await.unwrap().payload, json!(2));
    }

    #[tokio::test]
    async fn test_rooms_of_lists_joined_rooms() {
        let hub = InProcessChannelHub::default();
        let team = Uuid::new_v4();
        let a = ClientId::from("a");
        let _inbox = hub.connect(&a).unwrap();
        hub.join(&ChannelKey::team(team), &a).unwrap();
        hub.join(&ChannelKey::file(team, Uuid::new_v4()), &a).unwrap();

        assert_eq!(hub.rooms_of(&a).len(), 2);
        hub.disconnect(&a);
        assert!(hub.rooms_of(&a).is_empty());
    }
}
