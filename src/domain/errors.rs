//! Domain errors for the teamspace core.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors that can occur in the teamspace core.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Workspace node not found: {0}")]
    NodeNotFound(Uuid),

    #[error("Problem not found: {0}")]
    ProblemNotFound(Uuid),

    #[error("Team not found: {0}")]
    TeamNotFound(Uuid),

    #[error("Profile not found: {0}")]
    ProfileNotFound(Uuid),

    #[error("Voter {voter_id} already voted for problem {problem_id}")]
    DuplicateVote { problem_id: Uuid, voter_id: Uuid },

    #[error("Voting is closed for problem {problem_id} ({votes} votes collected)")]
    VotingClosed { problem_id: Uuid, votes: usize },

    #[error("Path already taken in team {team_id}: {full_path}")]
    PathConflict { team_id: Uuid, full_path: String },

    #[error("Team formation for problem {0} was completed by a concurrent request")]
    FormationRaceLost(Uuid),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Embedding provider failed: {0}")]
    EmbeddingFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DomainError {
    /// Uniqueness or state violations detected before any partial mutation remained.
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::DuplicateVote { .. }
                | Self::VotingClosed { .. }
                | Self::PathConflict { .. }
                | Self::FormationRaceLost(_)
        )
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NodeNotFound(_)
                | Self::ProblemNotFound(_)
                | Self::TeamNotFound(_)
                | Self::ProfileNotFound(_)
        )
    }

    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed(_) | Self::InvalidStateTransition { .. }
        )
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let dup = DomainError::DuplicateVote {
            problem_id: Uuid::new_v4(),
            voter_id: Uuid::new_v4(),
        };
        assert!(dup.is_conflict());
        assert!(!dup.is_not_found());

        let missing = DomainError::NodeNotFound(Uuid::new_v4());
        assert!(missing.is_not_found());
        assert!(!missing.is_conflict());

        assert!(DomainError::ValidationFailed("bad".to_string()).is_validation());
        assert!(!DomainError::DatabaseError("io".to_string()).is_validation());
    }

    #[test]
    fn test_voting_closed_message() {
        let err = DomainError::VotingClosed {
            problem_id: Uuid::nil(),
            votes: 6,
        };
        assert!(err.to_string().contains("6 votes"));
    }
}
