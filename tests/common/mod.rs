//! Common test utilities for integration tests
//!
//! Shared fixtures for building services over an in-memory migrated database.

#![allow(dead_code)]

use std::sync::Arc;

use sqlx::SqlitePool;
use uuid::Uuid;

use teamspace::adapters::realtime::InProcessChannelHub;
use teamspace::adapters::sqlite::{
    create_migrated_test_pool, SqliteProblemRepository, SqliteProfileRepository,
    SqliteTeamRepository, SqliteVoteRepository, SqliteWorkspaceRepository,
};
use teamspace::domain::models::{Problem, Profile, RealtimeConfig};
use teamspace::domain::ports::{ProblemRepository, ProfileRepository};
use teamspace::services::{EventBus, SimilarityEngine, SyncBus, TeamFormationService, WorkspaceService};

pub type Formation = TeamFormationService<
    SqliteVoteRepository,
    SqliteTeamRepository,
    SqliteProblemRepository,
    SqliteProfileRepository,
>;

pub async fn pool() -> SqlitePool {
    create_migrated_test_pool()
        .await
        .expect("Failed to create migrated test pool")
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub async fn seed_problem(pool: &SqlitePool, title: &str, description: &str, tags: &[&str]) -> Problem {
    let problem = Problem::new(title, description, "general")
        .with_tags(tags.iter().map(|t| (*t).to_string()).collect());
    SqliteProblemRepository::new(pool.clone())
        .create(&problem)
        .await
        .expect("Failed to seed problem");
    problem
}

pub async fn seed_contributor(pool: &SqlitePool, name: &str, bio: &str, skills: &[&str]) -> Uuid {
    let profile = Profile::contributor(name)
        .with_bio(bio)
        .with_skills(skills.iter().map(|s| (*s).to_string()).collect());
    SqliteProfileRepository::new(pool.clone())
        .create(&profile)
        .await
        .expect("Failed to seed profile");
    profile.id
}

pub fn formation(pool: &SqlitePool, engine: SimilarityEngine, events: Arc<EventBus>) -> Formation {
    TeamFormationService::new(
        Arc::new(SqliteVoteRepository::new(pool.clone())),
        Arc::new(SqliteTeamRepository::new(pool.clone())),
        Arc::new(SqliteProblemRepository::new(pool.clone())),
        Arc::new(SqliteProfileRepository::new(pool.clone())),
        Arc::new(engine),
    )
    .with_event_bus(events)
}

/// Workspace service wired to a fresh in-process sync bus.
pub fn workspace(pool: &SqlitePool) -> (WorkspaceService<SqliteWorkspaceRepository>, Arc<SyncBus>) {
    let sync = Arc::new(SyncBus::new(
        Arc::new(InProcessChannelHub::default()),
        &RealtimeConfig::default(),
    ));
    let service = WorkspaceService::new(Arc::new(SqliteWorkspaceRepository::new(pool.clone())))
        .with_sync_bus(sync.clone());
    (service, sync)
}
