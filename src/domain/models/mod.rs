pub mod config;
pub mod embedding;
pub mod problem;
pub mod profile;
pub mod team;
pub mod vote;
pub mod workspace;

pub use config::{Config, DatabaseConfig, EmbeddingConfig, LoggingConfig, RealtimeConfig};
pub use embedding::{similarity, EmbeddingVector};
pub use problem::{Problem, ProblemStatus};
pub use profile::{ActorRole, Profile};
pub use team::{FormationKind, MemberRole, Team, TeamMember, TeamProgress, TeamStatus};
pub use vote::{Vote, VoteTally, VOTE_QUORUM};
pub use workspace::{build_tree, NodeType, TreeNode, WorkspaceNode};
