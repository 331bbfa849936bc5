//! Teamspace - collaborative team workspaces
//!
//! Teamspace gives each team a shared virtual file hierarchy, fans changes out
//! to connected clients in realtime, and forms teams automatically once enough
//! contributors vote for a problem.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and port traits
//! - **Adapters** (`adapters`): SQLite repositories, embedding providers,
//!   the in-process realtime hub and caching decorators
//! - **Service Layer** (`services`): workspace hierarchy, sync bus, similarity
//!   ranking and team formation
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, setup
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use teamspace::adapters::sqlite::{create_migrated_test_pool, SqliteWorkspaceRepository};
//! use teamspace::services::{UpsertNode, WorkspaceService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = create_migrated_test_pool().await?;
//!     let workspace = WorkspaceService::new(Arc::new(SqliteWorkspaceRepository::new(pool)));
//!     let team = uuid::Uuid::new_v4();
//!     workspace.upsert(UpsertNode::folder(team, team, "", "src"), None).await?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Config, EmbeddingVector, NodeType, Problem, ProblemStatus, Profile, Team, TeamStatus, TreeNode,
    Vote, VoteTally, WorkspaceNode, VOTE_QUORUM,
};
pub use domain::ports::{ChannelProvider, EmbeddingProvider};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    EventBus, SimilarityEngine, SyncBus, TeamFormationService, TeamService, WorkspaceMirror,
    WorkspaceService,
};
