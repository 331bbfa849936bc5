//! Teamspace project initialization
//!
//! Creates the `.teamspace/` directory, writes the default config file and
//! brings the database schema up to date.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::adapters::sqlite::{initialize_database, PoolConfig};

use super::config::CONFIG_DIR;

/// Default configuration template content
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Teamspace Configuration
# Override settings by editing this file, adding .teamspace/local.yaml, or
# setting environment variables with the TEAMSPACE_ prefix
#
# Example environment variables:
#   export TEAMSPACE_DATABASE__PATH=/custom/path/teamspace.db
#   export TEAMSPACE_LOGGING__LEVEL=debug
#   export TEAMSPACE_EMBEDDING__PROVIDER=openai

database:
  # Path to SQLite database file (project-local)
  path: ".teamspace/teamspace.db"

  # Maximum number of database connections in pool
  max_connections: 10

logging:
  # Log level: trace, debug, info, warn, error
  level: "info"

  # Log format: json, pretty
  format: "pretty"

  # Rolling log files are written here when set
  # log_dir: ".teamspace/logs"

  # Rotation: daily, hourly, never
  rotation: "daily"

embedding:
  # openai (any OpenAI-compatible endpoint) or none (local token vectors)
  provider: "none"
  base_url: "https://api.openai.com/v1"
  model: "text-embedding-3-small"
  # api_key falls back to OPENAI_API_KEY
  timeout_secs: 10
  cache_capacity: 10000
  cache_ttl_secs: 3600

realtime:
  # Buffered messages per client inbox
  channel_capacity: 256

  # Deliver code:change only to clients with the file open
  scope_code_changes_to_file: false
"#;

/// Setup paths and directories
pub struct SetupPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub database_file: PathBuf,
}

impl SetupPaths {
    /// Get setup paths for the current directory
    pub fn new() -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Ok(Self::in_dir(&current_dir))
    }

    /// Setup paths rooted at `root`
    pub fn in_dir(root: &Path) -> Self {
        let config_dir = root.join(CONFIG_DIR);
        Self {
            config_file: config_dir.join("config.yaml"),
            database_file: config_dir.join("teamspace.db"),
            config_dir,
        }
    }

    /// Check if the project is already initialized
    pub fn is_initialized(&self) -> bool {
        self.config_file.exists() && self.database_file.exists()
    }
}

/// Create the configuration directory
pub fn create_config_dir(paths: &SetupPaths) -> Result<()> {
    fs::create_dir_all(&paths.config_dir).context("Failed to create config directory")
}

/// Create the default configuration file. Returns whether a file was written.
pub fn create_config_file(paths: &SetupPaths, force: bool) -> Result<bool> {
    if paths.config_file.exists() && !force {
        return Ok(false);
    }

    fs::write(&paths.config_file, DEFAULT_CONFIG_TEMPLATE).context("Failed to write config file")?;
    Ok(true)
}

/// Create the database if needed and apply pending migrations.
///
/// Migrations are tracked in `schema_migrations`, so running this on an
/// existing database only applies what is missing. Returns the schema version.
pub async fn run_migrations(database_file: &Path) -> Result<i64> {
    if let Some(parent) = database_file.parent() {
        fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let db_url = format!("sqlite:{}", database_file.display());
    let pool = initialize_database(
        &db_url,
        Some(PoolConfig {
            max_connections: 1,
            ..PoolConfig::default()
        }),
    )
    .await
    .context("Failed to initialize database")?;

    let version = crate::adapters::sqlite::Migrator::new(pool.clone())
        .get_current_version()
        .await
        .context("Failed to read schema version")?;
    pool.close().await;

    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_creates_config_and_database() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SetupPaths::in_dir(dir.path());
        assert!(!paths.is_initialized());

        create_config_dir(&paths).unwrap();
        assert!(create_config_file(&paths, false).unwrap());
        assert!(!create_config_file(&paths, false).unwrap());

        let version = run_migrations(&paths.database_file).await.unwrap();
        assert_eq!(version, 1);
        assert!(paths.is_initialized());

        // Second run is a no-op
        assert_eq!(run_migrations(&paths.database_file).await.unwrap(), 1);
    }

    #[test]
    fn test_default_template_is_valid_config() {
        let config: crate::domain::models::Config =
            serde_yaml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        crate::infrastructure::config::ConfigLoader::validate(&config).unwrap();
    }
}
