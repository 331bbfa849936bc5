//! Wiring of repositories and services for a CLI invocation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::adapters::cache::CachedEmbeddingProvider;
use crate::adapters::embeddings::{OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};
use crate::adapters::realtime::InProcessChannelHub;
use crate::adapters::sqlite::{
    initialize_from_config, SqliteProblemRepository, SqliteProfileRepository, SqliteTeamRepository,
    SqliteVoteRepository, SqliteWorkspaceRepository,
};
use crate::domain::models::{Config, EmbeddingConfig};
use crate::domain::ports::EmbeddingProvider;
use crate::infrastructure::config::ConfigLoader;
use crate::services::{EventBus, SimilarityEngine, SyncBus, TeamFormationService, TeamService, WorkspaceService};

pub type SqliteWorkspaceService = WorkspaceService<SqliteWorkspaceRepository>;
pub type SqliteFormationService = TeamFormationService<
    SqliteVoteRepository,
    SqliteTeamRepository,
    SqliteProblemRepository,
    SqliteProfileRepository,
>;
pub type SqliteTeamService = TeamService<SqliteTeamRepository, SqliteProfileRepository>;

/// Everything a command needs, built from the effective configuration.
pub struct AppContext {
    pub config: Config,
    pub pool: SqlitePool,
    pub events: Arc<EventBus>,
    pub engine: Arc<SimilarityEngine>,
    pub problems: Arc<SqliteProblemRepository>,
    pub profiles: Arc<SqliteProfileRepository>,
    pub workspace: SqliteWorkspaceService,
    pub formation: SqliteFormationService,
    pub teams: SqliteTeamService,
}

impl AppContext {
    /// Load configuration from the project and open the database.
    pub async fn load() -> Result<Self> {
        let config = ConfigLoader::load()?;
        Self::open(config).await
    }

    pub async fn open(config: Config) -> Result<Self> {
        let pool = initialize_from_config(&config.database)
            .await
            .with_context(|| format!("Failed to open database at {}", config.database.path))?;
        Ok(Self::with_pool(config, pool))
    }

    /// Build services over an already migrated pool.
    pub fn with_pool(config: Config, pool: SqlitePool) -> Self {
        let events = Arc::new(EventBus::default());
        let engine = Arc::new(SimilarityEngine::new(build_embedding_provider(&config.embedding)));
        let hub = Arc::new(InProcessChannelHub::new(config.realtime.channel_capacity));
        let sync = Arc::new(SyncBus::new(hub, &config.realtime));

        let problems = Arc::new(SqliteProblemRepository::new(pool.clone()));
        let profiles = Arc::new(SqliteProfileRepository::new(pool.clone()));
        let teams = Arc::new(SqliteTeamRepository::new(pool.clone()));

        let workspace = WorkspaceService::new(Arc::new(SqliteWorkspaceRepository::new(pool.clone())))
            .with_sync_bus(sync)
            .with_event_bus(events.clone());
        let formation = TeamFormationService::new(
            Arc::new(SqliteVoteRepository::new(pool.clone())),
            teams.clone(),
            problems.clone(),
            profiles.clone(),
            engine.clone(),
        )
        .with_event_bus(events.clone());
        let team_service = TeamService::new(teams, profiles.clone()).with_event_bus(events.clone());

        debug!(provider = engine.provider_name(), "services wired");
        Self {
            config,
            pool,
            events,
            engine,
            problems,
            profiles,
            workspace,
            formation,
            teams: team_service,
        }
    }
}

/// Dense provider wrapped in the vector cache, or `None` for local vectors.
///
/// A provider that cannot be constructed is logged and skipped; ranking then
/// uses the local token representation.
pub fn build_embedding_provider(config: &EmbeddingConfig) -> Option<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "openai" => match OpenAiEmbeddingProvider::new(OpenAiEmbeddingConfig::from(config)) {
            Ok(provider) => {
                info!(model = %config.model, "using OpenAI-compatible embeddings");
                Some(Arc::new(CachedEmbeddingProvider::with_limits(
                    Arc::new(provider),
                    config.cache_capacity,
                    Duration::from_secs(config.cache_ttl_secs),
                )))
            }
            Err(e) => {
                tracing::warn!(error = %e, "embedding provider unavailable, using token vectors");
                None
            }
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    #[test]
    fn test_no_provider_by_default() {
        assert!(build_embedding_provider(&EmbeddingConfig::default()).is_none());
    }

    #[test]
    fn test_openai_provider_is_cached() {
        let config = EmbeddingConfig {
            provider: "openai".to_string(),
            api_key: Some("sk-test".to_string()),
            ..EmbeddingConfig::default()
        };
        let provider = build_embedding_provider(&config).unwrap();
        assert_eq!(provider.dimension(), 1536);
    }

    #[tokio::test]
    async fn test_context_over_test_pool() {
        let pool = create_migrated_test_pool().await.unwrap();
        let ctx = AppContext::with_pool(Config::default(), pool);
        assert_eq!(ctx.engine.provider_name(), "local");
        assert_eq!(ctx.formation.quorum(), crate::domain::models::VOTE_QUORUM);
    }
}
