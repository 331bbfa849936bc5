//! Application services: workspace hierarchy, realtime sync, similarity
//! ranking and vote-driven team formation.

pub mod event_bus;
pub mod keyed_lock;
pub mod similarity_engine;
pub mod sync_bus;
pub mod team_formation;
pub mod team_service;
pub mod workspace_mirror;
pub mod workspace_service;

pub use event_bus::{
    DomainEvent, EventBus, EventBusConfig, EventCategory, EventPayload, EventSeverity,
    SequenceNumber, WorkspaceChange,
};
pub use keyed_lock::KeyedLock;
pub use similarity_engine::{Candidate, RankedCandidate, SimilarityEngine};
pub use sync_bus::{CodeChange, DirectoryAction, DirectoryUpdate, SyncBus, SyncEvent};
pub use team_formation::{team_name_for, TeamFormationService, VoteOutcome};
pub use team_service::TeamService;
pub use workspace_mirror::{MirrorChange, WorkspaceMirror};
pub use workspace_service::{RenameOutcome, UpsertNode, UpsertOutcome, WorkspaceService};
