//! Vote repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Vote;

/// Repository interface for Vote persistence.
#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// Record a vote and append its id to the problem's vote list atomically.
    ///
    /// Fails with `DuplicateVote` when the (problem, voter) pair already exists.
    async fn record(&self, vote: &Vote) -> DomainResult<()>;

    /// Check whether a voter already voted for a problem.
    async fn exists(&self, problem_id: Uuid, voter_id: Uuid) -> DomainResult<bool>;

    /// Count persisted votes for a problem.
    async fn count_for_problem(&self, problem_id: Uuid) -> DomainResult<usize>;

    /// Earliest `limit` votes for a problem, oldest first.
    async fn earliest_for_problem(&self, problem_id: Uuid, limit: usize) -> DomainResult<Vec<Vote>>;
}
