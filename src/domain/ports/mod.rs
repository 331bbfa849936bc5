//! Port trait definitions (hexagonal architecture).
//!
//! Adapters implement these traits:
//! - Repositories for workspace nodes, votes, teams, problems and profiles
//! - EmbeddingProvider for dense vectors
//! - ChannelProvider for realtime rooms

pub mod embedding;
pub mod null_embedding;
pub mod problem_repository;
pub mod profile_repository;
pub mod realtime_channel;
pub mod team_repository;
pub mod vote_repository;
pub mod workspace_repository;

pub use embedding::EmbeddingProvider;
pub use null_embedding::NullEmbeddingProvider;
pub use problem_repository::ProblemRepository;
pub use profile_repository::ProfileRepository;
pub use realtime_channel::{
    ChannelError, ChannelKey, ChannelMessage, ChannelProvider, ClientId, ClientInbox,
};
pub use team_repository::TeamRepository;
pub use vote_repository::VoteRepository;
pub use workspace_repository::WorkspaceRepository;
