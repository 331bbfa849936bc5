//! Problem repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Problem;

/// Repository interface for Problem persistence.
#[async_trait]
pub trait ProblemRepository: Send + Sync {
    /// Create a new problem.
    async fn create(&self, problem: &Problem) -> DomainResult<()>;

    /// Get a problem by ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Problem>>;

    /// Link a team to the problem and move it to in-progress.
    ///
    /// Idempotent: linking the same team twice leaves one entry.
    async fn attach_team(&self, problem_id: Uuid, team_id: Uuid) -> DomainResult<()>;
}
