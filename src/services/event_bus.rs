//! EventBus service for domain notifications.
//!
//! Services publish what happened (votes recorded, teams formed, workspace
//! mutations) to a broadcast channel; interested consumers such as
//! notification fan-out or the CLI subscribe. Every event gets a sequence
//! number in publish order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Unique identifier for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonically increasing sequence number assigned by EventBus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceNumber(pub u64);

impl std::fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Event severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    Info,
    Warning,
}

/// Event category for filtering and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Voting,
    Team,
    Workspace,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Voting => write!(f, "voting"),
            Self::Team => write!(f, "team"),
            Self::Workspace => write!(f, "workspace"),
        }
    }
}

/// Kind of change applied to a team workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceChange {
    Created,
    Updated,
    Renamed,
    Removed,
}

/// Event payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EventPayload {
    VoteRecorded {
        problem_id: Uuid,
        voter_id: Uuid,
        votes: usize,
    },
    VotingClosed {
        problem_id: Uuid,
        votes: usize,
    },
    TeamFormed {
        team_id: Uuid,
        problem_id: Uuid,
        leader_id: Uuid,
        member_ids: Vec<Uuid>,
    },
    /// Link-back to the problem or a member profile failed after the team was saved
    TeamLinkFailed {
        team_id: Uuid,
        target_id: Uuid,
        error: String,
    },
    TeamStatusChanged {
        team_id: Uuid,
        from: String,
        to: String,
    },
    WorkspaceMutated {
        team_id: Uuid,
        change: WorkspaceChange,
        node_ids: Vec<Uuid>,
    },
}

impl EventPayload {
    fn classify(&self) -> (EventCategory, EventSeverity) {
        match self {
            Self::VoteRecorded { .. } | Self::VotingClosed { .. } => {
                (EventCategory::Voting, EventSeverity::Info)
            }
            Self::TeamFormed { .. } | Self::TeamStatusChanged { .. } => {
                (EventCategory::Team, EventSeverity::Info)
            }
            Self::TeamLinkFailed { .. } => (EventCategory::Team, EventSeverity::Warning),
            Self::WorkspaceMutated { .. } => (EventCategory::Workspace, EventSeverity::Info),
        }
    }
}

/// Event envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    pub id: EventId,
    pub sequence: SequenceNumber,
    pub timestamp: DateTime<Utc>,
    pub severity: EventSeverity,
    pub category: EventCategory,
    pub payload: EventPayload,
}

/// Configuration for the EventBus.
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Channel capacity for the broadcast channel.
    pub channel_capacity: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

/// Central event bus for broadcasting domain events to multiple consumers.
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
    sequence: AtomicU64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EventBusConfig::default())
    }
}

impl EventBus {
    pub fn new(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            sender,
            sequence: AtomicU64::new(0),
        }
    }

    /// Publish an event and return the sequence number it was given.
    pub fn publish(&self, payload: EventPayload) -> SequenceNumber {
        let sequence = SequenceNumber(self.sequence.fetch_add(1, Ordering::SeqCst));
        let (category, severity) = payload.classify();
        let event = DomainEvent {
            id: EventId::new(),
            sequence,
            timestamp: Utc::now(),
            severity,
            category,
            payload,
        };

        // No subscribers is not an error
        let _ = self.sender.send(event);
        sequence
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Sequence number the next event will receive.
    pub fn current_sequence(&self) -> SequenceNumber {
        SequenceNumber(self.sequence.load(Ordering::SeqCst))
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_sequence_assignment() {
        let bus = EventBus::default();
        assert_eq!(bus.current_sequence().0, 0);

        let mut rx = bus.subscribe();
        let problem_id = Uuid::new_v4();

        bus.publish(EventPayload::VoteRecorded {
            problem_id,
            voter_id: Uuid::new_v4(),
            votes: 1,
        });
        let first = rx.recv().await.unwrap();
        assert_eq!(first.sequence.0, 0);
        assert_eq!(first.category, EventCategory::Voting);

        bus.publish(EventPayload::VotingClosed { problem_id, votes: 6 });
        let second = rx.recv().await.unwrap();
        assert_eq!(second.sequence.0, 1);

        assert_eq!(bus.current_sequence().0, 2);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::default();
        let seq = bus.publish(EventPayload::WorkspaceMutated {
            team_id: Uuid::new_v4(),
            change: WorkspaceChange::Created,
            node_ids: vec![Uuid::new_v4()],
        });
        assert_eq!(seq.0, 0);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_link_failure_is_a_warning() {
        let payload = EventPayload::TeamLinkFailed {
            team_id: Uuid::new_v4(),
            target_id: Uuid::new_v4(),
            error: "boom".to_string(),
        };
        assert_eq!(payload.classify(), (EventCategory::Team, EventSeverity::Warning));
    }

    #[test]
    fn test_payload_serializes_with_type_tag() {
        let payload = EventPayload::VotingClosed {
            problem_id: Uuid::nil(),
            votes: 6,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "VotingClosed");
        assert_eq!(json["data"]["votes"], 6);
    }
}
