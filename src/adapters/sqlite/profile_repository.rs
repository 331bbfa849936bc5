//! SQLite implementation of the ProfileRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{parse_datetime, parse_json_or_default, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ActorRole, Profile};
use crate::domain::ports::ProfileRepository;

/// SQLite-backed profile store.
pub struct SqliteProfileRepository {
    pool: SqlitePool,
}

impl SqliteProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for SqliteProfileRepository {
    async fn create(&self, profile: &Profile) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO profiles (id, name, role, bio, skills, team_ids, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(profile.id.to_string())
        .bind(&profile.name)
        .bind(profile.role.as_str())
        .bind(&profile.bio)
        .bind(serde_json::to_string(&profile.skills)?)
        .bind(serde_json::to_string(&profile.team_ids)?)
        .bind(profile.created_at.to_rfc3339())
        .bind(profile.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Profile>> {
        let row: Option<ProfileRow> = sqlx::query_as("SELECT * FROM profiles WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_many(&self, ids: &[Uuid]) -> DomainResult<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("SELECT * FROM profiles WHERE id IN ({placeholders})");
        let mut query = sqlx::query_as::<_, ProfileRow>(&sql);
        for id in ids {
            query = query.bind(id.to_string());
        }
        let rows = query.fetch_all(&self.pool).await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn assign_team(&self, user_id: Uuid, team_id: Uuid) -> DomainResult<()> {
        let team = team_id.to_string();
        let result = sqlx::query(
            r#"UPDATE profiles SET
                 team_ids = CASE
                     WHEN EXISTS (SELECT 1 FROM json_each(profiles.team_ids) WHERE value = ?)
                     THEN team_ids
                     ELSE json_insert(team_ids, '$[#]', ?)
                 END,
                 updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&team)
        .bind(&team)
        .bind(Utc::now().to_rfc3339())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::ProfileNotFound(user_id));
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: String,
    name: String,
    role: String,
    bio: String,
    skills: Option<String>,
    team_ids: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = DomainError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let role = ActorRole::from_str(&row.role).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid role: {}", row.role))
        })?;

        Ok(Profile {
            id: parse_uuid(&row.id)?,
            name: row.name,
            role,
            bio: row.bio,
            skills: parse_json_or_default(row.skills)?,
            team_ids: parse_json_or_default(row.team_ids)?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
