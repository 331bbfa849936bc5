//! Team formation coordinator.
//!
//! Per problem: `collecting votes -> quorum reached -> team formed`. Every
//! vote for a problem runs under that problem's lock, from the duplicate
//! check through team creation and link-back. The partial unique index on
//! auto-formed teams backs this up across processes: a second insert loses
//! with `FormationRaceLost` instead of creating a duplicate.
//!
//! The trigger is re-derived from the persisted vote count on every call, so
//! a formation that failed after its vote was stored is completed by
//! [`TeamFormationService::reconcile`] or by the next vote attempt.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::event_bus::{EventBus, EventPayload};
use super::keyed_lock::KeyedLock;
use super::similarity_engine::{Candidate, SimilarityEngine};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{FormationKind, Problem, Profile, Team, Vote, VoteTally, VOTE_QUORUM};
use crate::domain::ports::{ProblemRepository, ProfileRepository, TeamRepository, VoteRepository};

/// Result of casting a vote.
#[derive(Debug, Clone)]
pub struct VoteOutcome {
    /// The stored vote
    pub vote: Vote,
    /// Tally after this vote
    pub tally: VoteTally,
    /// Set when this vote completed the quorum and a team was formed
    pub team: Option<Team>,
}

/// Vote intake and automatic team formation.
pub struct TeamFormationService<V, T, P, U>
where
    V: VoteRepository + 'static,
    T: TeamRepository + 'static,
    P: ProblemRepository + 'static,
    U: ProfileRepository + 'static,
{
    votes: Arc<V>,
    teams: Arc<T>,
    problems: Arc<P>,
    profiles: Arc<U>,
    engine: Arc<SimilarityEngine>,
    events: Option<Arc<EventBus>>,
    problem_locks: KeyedLock<Uuid>,
    quorum: usize,
}

impl<V, T, P, U> TeamFormationService<V, T, P, U>
where
    V: VoteRepository + 'static,
    T: TeamRepository + 'static,
    P: ProblemRepository + 'static,
    U: ProfileRepository + 'static,
{
    /// Create a service with the default quorum.
    pub fn new(
        votes: Arc<V>,
        teams: Arc<T>,
        problems: Arc<P>,
        profiles: Arc<U>,
        engine: Arc<SimilarityEngine>,
    ) -> Self {
        Self {
            votes,
            teams,
            problems,
            profiles,
            engine,
            events: None,
            problem_locks: KeyedLock::new(),
            quorum: VOTE_QUORUM,
        }
    }

    /// Publish formation events to this bus.
    pub fn with_event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Votes needed to form a team.
    pub fn quorum(&self) -> usize {
        self.quorum
    }

    /// Cast a vote and form the team if this vote completes the quorum.
    #[instrument(skip(self), fields(quorum = self.quorum))]
    pub async fn cast_vote(&self, problem_id: Uuid, voter_id: Uuid) -> DomainResult<VoteOutcome> {
        let problem = self.require_problem(problem_id).await?;
        let _guard = self.problem_locks.lock(&problem_id).await;

        if self.votes.exists(problem_id, voter_id).await? {
            return Err(DomainError::DuplicateVote { problem_id, voter_id });
        }

        let count = self.votes.count_for_problem(problem_id).await?;
        if count >= self.quorum {
            // A closed problem without its team means an earlier formation failed
            if let Err(e) = self.ensure_team_locked(&problem).await {
                warn!(problem_id = %problem_id, error = %e, "formation retry failed");
            }
            return Err(DomainError::VotingClosed { problem_id, votes: count });
        }

        let vote = Vote::new(problem_id, voter_id);
        self.votes.record(&vote).await?;

        // Recount from the store; never trust the pre-insert count
        let count = self.votes.count_for_problem(problem_id).await?;
        info!(problem_id = %problem_id, voter_id = %voter_id, votes = count, "vote recorded");
        self.publish(EventPayload::VoteRecorded {
            problem_id,
            voter_id,
            votes: count,
        });

        let mut team = None;
        if count >= self.quorum {
            if count == self.quorum {
                self.publish(EventPayload::VotingClosed { problem_id, votes: count });
            }
            // The vote stays recorded whatever happens here
            match self.form_locked(&problem).await {
                Ok(formed) => team = formed,
                Err(e) => {
                    warn!(problem_id = %problem_id, error = %e, "team formation failed; will retry on reconcile");
                }
            }
        }

        let team_id = match &team {
            Some(t) => Some(t.id),
            None => self.first_team_id(problem_id).await?,
        };
        Ok(VoteOutcome {
            vote,
            tally: VoteTally {
                problem_id,
                votes: count,
                quorum: self.quorum,
                team_id,
            },
            team,
        })
    }

    /// Current voting state of a problem.
    pub async fn vote_status(&self, problem_id: Uuid) -> DomainResult<VoteTally> {
        self.require_problem(problem_id).await?;
        Ok(VoteTally {
            problem_id,
            votes: self.votes.count_for_problem(problem_id).await?,
            quorum: self.quorum,
            team_id: self.first_team_id(problem_id).await?,
        })
    }

    /// Complete any formation or link-back the persisted votes call for.
    ///
    /// Returns the problem's team, or `None` while voting is still open.
    #[instrument(skip(self))]
    pub async fn reconcile(&self, problem_id: Uuid) -> DomainResult<Option<Team>> {
        let problem = self.require_problem(problem_id).await?;
        let _guard = self.problem_locks.lock(&problem_id).await;
        self.ensure_team_locked(&problem).await
    }

    /// Form a team by hand, bypassing voting.
    #[instrument(skip(self, members))]
    pub async fn form_team_manually(
        &self,
        problem_id: Uuid,
        name: Option<String>,
        leader_id: Uuid,
        members: Vec<Uuid>,
    ) -> DomainResult<Team> {
        let problem = self.require_problem(problem_id).await?;

        let mut seen = HashSet::from([leader_id]);
        let members: Vec<Uuid> = members.into_iter().filter(|id| seen.insert(*id)).collect();
        let roster: Vec<Uuid> = std::iter::once(leader_id).chain(members.iter().copied()).collect();
        let found = self.profiles.get_many(&roster).await?;
        if let Some(missing) = roster.iter().find(|id| !found.iter().any(|p| p.id == **id)) {
            return Err(DomainError::ProfileNotFound(*missing));
        }

        let name = name.unwrap_or_else(|| team_name_for(&problem));
        if name.trim().is_empty() {
            return Err(DomainError::ValidationFailed("team name cannot be empty".to_string()));
        }

        let _guard = self.problem_locks.lock(&problem_id).await;
        let team = Team::new(name, problem_id, leader_id, members, FormationKind::Manual);
        self.teams.create(&team).await?;
        info!(team_id = %team.id, problem_id = %problem_id, members = team.members.len(), "team formed manually");

        self.announce(&team);
        self.link_back(&team, &found).await;
        Ok(team)
    }

    async fn ensure_team_locked(&self, problem: &Problem) -> DomainResult<Option<Team>> {
        let count = self.votes.count_for_problem(problem.id).await?;
        if count < self.quorum {
            return Ok(None);
        }
        if let Some(existing) = self.teams.list_by_problem(problem.id).await?.into_iter().next() {
            let profiles = self.profiles.get_many(&existing.member_ids()).await?;
            self.link_back(&existing, &profiles).await;
            return Ok(Some(existing));
        }
        self.form_locked(problem).await
    }

    /// Rank the earliest voters and create the team. Caller holds the problem lock.
    async fn form_locked(&self, problem: &Problem) -> DomainResult<Option<Team>> {
        if !self.teams.list_by_problem(problem.id).await?.is_empty() {
            debug!(problem_id = %problem.id, "team already exists, skipping formation");
            return Ok(None);
        }

        let votes = self.votes.earliest_for_problem(problem.id, self.quorum).await?;
        if votes.len() < self.quorum {
            return Ok(None);
        }

        let voter_ids: Vec<Uuid> = votes.iter().map(|v| v.voter_id).collect();
        let profiles = self.profiles.get_many(&voter_ids).await?;
        let by_id: HashMap<Uuid, &Profile> = profiles.iter().map(|p| (p.id, p)).collect();

        let candidates = voter_ids
            .iter()
            .enumerate()
            .map(|(order, id)| {
                let (text, tags) = by_id
                    .get(id)
                    .map(|p| (p.bio.clone(), p.skills.clone()))
                    .unwrap_or_default();
                Candidate {
                    id: *id,
                    text,
                    tags,
                    order,
                }
            })
            .collect();

        let ranked = self
            .engine
            .rank(&problem.ranking_text(), &problem.tags, candidates)
            .await;
        let Some((leader, rest)) = ranked.split_first() else {
            return Ok(None);
        };
        debug!(
            problem_id = %problem.id,
            leader_id = %leader.id,
            leader_score = leader.score,
            provider = self.engine.provider_name(),
            "voters ranked"
        );

        let team = Team::new(
            team_name_for(problem),
            problem.id,
            leader.id,
            rest.iter().map(|r| r.id),
            FormationKind::Auto,
        );
        match self.teams.create(&team).await {
            Ok(()) => {}
            Err(DomainError::FormationRaceLost(problem_id)) => {
                info!(problem_id = %problem_id, "another formation won the race");
                return Ok(None);
            }
            Err(e) => return Err(e),
        }

        info!(team_id = %team.id, problem_id = %problem.id, leader_id = %leader.id, "team formed");
        self.announce(&team);
        self.link_back(&team, &profiles).await;
        Ok(Some(team))
    }

    /// Link the team to its problem and to contributor profiles.
    ///
    /// Failures are logged and published; every step is idempotent so
    /// `reconcile` can safely run it again.
    async fn link_back(&self, team: &Team, profiles: &[Profile]) {
        if let Err(e) = self.problems.attach_team(team.problem_id, team.id).await {
            warn!(team_id = %team.id, problem_id = %team.problem_id, error = %e, "failed to link team to problem");
            self.publish(EventPayload::TeamLinkFailed {
                team_id: team.id,
                target_id: team.problem_id,
                error: e.to_string(),
            });
        }

        for profile in profiles.iter().filter(|p| p.is_contributor() && team.has_member(p.id)) {
            if let Err(e) = self.profiles.assign_team(profile.id, team.id).await {
                warn!(team_id = %team.id, user_id = %profile.id, error = %e, "failed to record team on profile");
                self.publish(EventPayload::TeamLinkFailed {
                    team_id: team.id,
                    target_id: profile.id,
                    error: e.to_string(),
                });
            }
        }
    }

    fn announce(&self, team: &Team) {
        if let Some(leader_id) = team.leader() {
            self.publish(EventPayload::TeamFormed {
                team_id: team.id,
                problem_id: team.problem_id,
                leader_id,
                member_ids: team.member_ids(),
            });
        }
    }

    async fn require_problem(&self, problem_id: Uuid) -> DomainResult<Problem> {
        self.problems
            .get(problem_id)
            .await?
            .ok_or(DomainError::ProblemNotFound(problem_id))
    }

    async fn first_team_id(&self, problem_id: Uuid) -> DomainResult<Option<Uuid>> {
        Ok(self
            .teams
            .list_by_problem(problem_id)
            .await?
            .first()
            .map(|t| t.id))
    }

    fn publish(&self, payload: EventPayload) {
        if let Some(events) = &self.events {
            events.publish(payload);
        }
    }
}

/// Default team name derived from the problem title.
pub fn team_name_for(problem: &Problem) -> String {
    format!("{} Team", problem.title.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{
        create_migrated_test_pool, SqliteProblemRepository, SqliteProfileRepository,
        SqliteTeamRepository, SqliteVoteRepository,
    };
    use crate::domain::models::{ActorRole, ProblemStatus};

    type Service = TeamFormationService<
        SqliteVoteRepository,
        SqliteTeamRepository,
        SqliteProblemRepository,
        SqliteProfileRepository,
    >;

    struct Fixture {
        service: Service,
        problems: Arc<SqliteProblemRepository>,
        profiles: Arc<SqliteProfileRepository>,
    }

    async fn setup() -> Fixture {
        let pool = create_migrated_test_pool().await.unwrap();
        let problems = Arc::new(SqliteProblemRepository::new(pool.clone()));
        let profiles = Arc::new(SqliteProfileRepository::new(pool.clone()));
        let service = TeamFormationService::new(
            Arc::new(SqliteVoteRepository::new(pool.clone())),
            Arc::new(SqliteTeamRepository::new(pool)),
            problems.clone(),
            profiles.clone(),
            Arc::new(SimilarityEngine::local()),
        );
        Fixture {
            service,
            problems,
            profiles,
        }
    }

    async fn problem(fx: &Fixture) -> Problem {
        let problem = Problem::new("Solar mapping", "map rooftop solar potential", "energy");
        fx.problems.create(&problem).await.unwrap();
        problem
    }

    async fn contributor(fx: &Fixture, bio: &str) -> Uuid {
        let profile = Profile::contributor("voter").with_bio(bio);
        fx.profiles.create(&profile).await.unwrap();
        profile.id
    }

    #[tokio::test]
    async fn test_vote_for_missing_problem() {
        let fx = setup().await;
        let err = fx.service.cast_vote(Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::ProblemNotFound(_)));
    }

    #[tokio::test]
    async fn test_quorum_forms_single_team() {
        let fx = setup().await;
        let problem = problem(&fx).await;

        let mut last = None;
        for i in 0..VOTE_QUORUM {
            let voter = contributor(&fx, &format!("voter {i}")).await;
            let outcome = fx.service.cast_vote(problem.id, voter).await.unwrap();
            if i + 1 < VOTE_QUORUM {
                assert!(outcome.team.is_none());
            }
            last = Some(outcome);
        }

        let outcome = last.unwrap();
        let team = outcome.team.unwrap();
        assert_eq!(team.members.len(), VOTE_QUORUM);
        assert_eq!(team.formation, FormationKind::Auto);
        assert_eq!(outcome.tally.team_id, Some(team.id));

        let stored = fx.problems.get(problem.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ProblemStatus::InProgress);
        assert_eq!(stored.selected_team_ids, vec![team.id]);
        assert_eq!(stored.vote_ids.len(), VOTE_QUORUM);
    }

    #[tokio::test]
    async fn test_only_contributors_get_team_on_profile() {
        let fx = setup().await;
        let problem = problem(&fx).await;
        let mentor = Profile::new("mentor", ActorRole::Mentor);
        fx.profiles.create(&mentor).await.unwrap();

        fx.service.cast_vote(problem.id, mentor.id).await.unwrap();
        let mut contributors = Vec::new();
        for _ in 1..VOTE_QUORUM {
            let id = contributor(&fx, "").await;
            contributors.push(id);
            fx.service.cast_vote(problem.id, id).await.unwrap();
        }

        let team_id = fx.service.vote_status(problem.id).await.unwrap().team_id.unwrap();
        assert!(fx.profiles.get(mentor.id).await.unwrap().unwrap().team_ids.is_empty());
        for id in contributors {
            assert_eq!(fx.profiles.get(id).await.unwrap().unwrap().team_ids, vec![team_id]);
        }
    }

    #[tokio::test]
    async fn test_manual_formation_validates_profiles() {
        let fx = setup().await;
        let problem = problem(&fx).await;
        let leader = contributor(&fx, "").await;

        let err = fx
            .service
            .form_team_manually(problem.id, None, leader, vec![Uuid::new_v4()])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ProfileNotFound(_)));

        let member = contributor(&fx, "").await;
        let team = fx
            .service
            .form_team_manually(problem.id, Some("Crew".to_string()), leader, vec![member, leader, member])
            .await
            .unwrap();
        assert_eq!(team.name, "Crew");
        assert_eq!(team.member_ids(), vec![leader, member]);
        assert_eq!(team.formation, FormationKind::Manual);
    }

    #[tokio::test]
    async fn test_reconcile_before_quorum() {
        let fx = setup().await;
        let problem = problem(&fx).await;
        fx.service.cast_vote(problem.id, contributor(&fx, "").await).await.unwrap();

        assert!(fx.service.reconcile(problem.id).await.unwrap().is_none());
        let tally = fx.service.vote_status(problem.id).await.unwrap();
        assert_eq!(tally.votes, 1);
        assert_eq!(tally.remaining(), VOTE_QUORUM - 1);
    }

    #[test]
    fn test_team_name_from_title() {
        let problem = Problem::new("  Clean Rivers ", "", "");
        assert_eq!(team_name_for(&problem), "Clean Rivers Team");
    }
}
