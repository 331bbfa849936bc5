//! Team repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Team;

/// Repository interface for Team persistence.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Create a team.
    ///
    /// At most one auto-formed team may exist per problem; a second insert
    /// fails with `FormationRaceLost`.
    async fn create(&self, team: &Team) -> DomainResult<()>;

    /// Get a team by ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Team>>;

    /// Teams linked to a problem, oldest first.
    async fn list_by_problem(&self, problem_id: Uuid) -> DomainResult<Vec<Team>>;

    /// Teams a user belongs to.
    async fn list_for_member(&self, user_id: Uuid) -> DomainResult<Vec<Team>>;

    /// Update status, progress, mentor and roster of an existing team.
    async fn update(&self, team: &Team) -> DomainResult<()>;
}
