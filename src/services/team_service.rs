//! Team lifecycle operations after formation.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use super::event_bus::{EventBus, EventPayload};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ActorRole, Team, TeamStatus};
use crate::domain::ports::{ProfileRepository, TeamRepository};

/// Team lookups and lifecycle changes.
pub struct TeamService<T, U>
where
    T: TeamRepository + 'static,
    U: ProfileRepository + 'static,
{
    teams: Arc<T>,
    profiles: Arc<U>,
    events: Option<Arc<EventBus>>,
}

impl<T, U> TeamService<T, U>
where
    T: TeamRepository + 'static,
    U: ProfileRepository + 'static,
{
    /// Create a service over the team and profile stores.
    pub fn new(teams: Arc<T>, profiles: Arc<U>) -> Self {
        Self {
            teams,
            profiles,
            events: None,
        }
    }

    /// Publish team events to this bus.
    pub fn with_event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Get a team by id.
    pub async fn get(&self, team_id: Uuid) -> DomainResult<Team> {
        self.teams
            .get(team_id)
            .await?
            .ok_or(DomainError::TeamNotFound(team_id))
    }

    /// Teams formed for a problem.
    pub async fn list_by_problem(&self, problem_id: Uuid) -> DomainResult<Vec<Team>> {
        self.teams.list_by_problem(problem_id).await
    }

    /// Teams a profile belongs to.
    pub async fn list_for_member(&self, user_id: Uuid) -> DomainResult<Vec<Team>> {
        self.teams.list_for_member(user_id).await
    }

    /// Record progress on the team's current phase.
    #[instrument(skip(self, phase))]
    pub async fn update_progress(
        &self,
        team_id: Uuid,
        phase: impl Into<String>,
        percentage: u8,
    ) -> DomainResult<Team> {
        let mut team = self.get(team_id).await?;
        if team.status.is_terminal() {
            return Err(DomainError::ValidationFailed(format!(
                "team {team_id} is {}",
                team.status.as_str()
            )));
        }
        team.set_progress(phase, percentage)
            .map_err(DomainError::ValidationFailed)?;
        self.teams.update(&team).await?;
        info!(team_id = %team_id, phase = %team.progress.phase, percentage, "team progress updated");
        Ok(team)
    }

    /// Assign a mentor. The profile must exist and carry the mentor role.
    #[instrument(skip(self))]
    pub async fn assign_mentor(&self, team_id: Uuid, mentor_id: Uuid) -> DomainResult<Team> {
        let mentor = self
            .profiles
            .get(mentor_id)
            .await?
            .ok_or(DomainError::ProfileNotFound(mentor_id))?;
        if mentor.role != ActorRole::Mentor {
            return Err(DomainError::ValidationFailed(format!(
                "profile {mentor_id} is a {}, not a mentor",
                mentor.role.as_str()
            )));
        }

        let mut team = self.get(team_id).await?;
        team.mentor_id = Some(mentor_id);
        team.updated_at = chrono::Utc::now();
        self.teams.update(&team).await?;
        info!(team_id = %team_id, mentor_id = %mentor_id, "mentor assigned");
        Ok(team)
    }

    /// Move a team to a new status, rejecting illegal transitions.
    #[instrument(skip(self))]
    pub async fn transition_status(&self, team_id: Uuid, to: TeamStatus) -> DomainResult<Team> {
        let mut team = self.get(team_id).await?;
        let from = team.status;
        team.transition_to(to)
            .map_err(|_| DomainError::InvalidStateTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            })?;
        self.teams.update(&team).await?;

        info!(team_id = %team_id, from = from.as_str(), to = to.as_str(), "team status changed");
        if let Some(events) = &self.events {
            events.publish(EventPayload::TeamStatusChanged {
                team_id,
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }
        Ok(team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{
        create_migrated_test_pool, SqliteProblemRepository, SqliteProfileRepository,
        SqliteTeamRepository,
    };
    use crate::domain::models::{FormationKind, Problem, Profile};
    use crate::domain::ports::ProblemRepository;

    async fn setup() -> (TeamService<SqliteTeamRepository, SqliteProfileRepository>, Team, Arc<SqliteProfileRepository>) {
        let pool = create_migrated_test_pool().await.unwrap();
        let problem = Problem::new("Flood alerts", "", "climate");
        SqliteProblemRepository::new(pool.clone())
            .create(&problem)
            .await
            .unwrap();

        let teams = Arc::new(SqliteTeamRepository::new(pool.clone()));
        let profiles = Arc::new(SqliteProfileRepository::new(pool));
        let team = Team::new("Flood alerts Team", problem.id, Uuid::new_v4(), Vec::new(), FormationKind::Manual);
        teams.create(&team).await.unwrap();
        (TeamService::new(teams, profiles.clone()), team, profiles)
    }

    #[tokio::test]
    async fn test_status_transitions_emit_events() {
        let (service, team, _) = setup().await;
        let events = Arc::new(EventBus::default());
        let service = service.with_event_bus(events.clone());
        let mut rx = events.subscribe();

        let updated = service
            .transition_status(team.id, TeamStatus::Submitted)
            .await
            .unwrap();
        assert_eq!(updated.status, TeamStatus::Submitted);

        let event = rx.recv().await.unwrap();
        assert!(matches!(event.payload, EventPayload::TeamStatusChanged { ref to, .. } if to == "submitted"));

        let err = service
            .transition_status(team.id, TeamStatus::Active)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition { .. }));
    }

    #[tokio::test]
    async fn test_progress_bounds() {
        let (service, team, _) = setup().await;
        let updated = service.update_progress(team.id, "building", 40).await.unwrap();
        assert_eq!(updated.progress.percentage, 40);
        assert_eq!(service.get(team.id).await.unwrap().progress.phase, "building");

        let err = service.update_progress(team.id, "building", 140).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_mentor_must_have_mentor_role() {
        let (service, team, profiles) = setup().await;
        let contributor = Profile::contributor("c");
        let mentor = Profile::new("m", ActorRole::Mentor);
        profiles.create(&contributor).await.unwrap();
        profiles.create(&mentor).await.unwrap();

        assert!(service.assign_mentor(team.id, contributor.id).await.is_err());
        let updated = service.assign_mentor(team.id, mentor.id).await.unwrap();
        assert_eq!(updated.mentor_id, Some(mentor.id));
    }
}
