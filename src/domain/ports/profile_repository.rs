//! Profile repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Profile;

/// Repository interface for actor profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Create a new profile.
    async fn create(&self, profile: &Profile) -> DomainResult<()>;

    /// Get a profile by ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Profile>>;

    /// Get several profiles; missing ids are skipped.
    async fn get_many(&self, ids: &[Uuid]) -> DomainResult<Vec<Profile>>;

    /// Record a team on the profile. Idempotent.
    async fn assign_team(&self, user_id: Uuid, team_id: Uuid) -> DomainResult<()>;
}
