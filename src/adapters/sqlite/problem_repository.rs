//! SQLite implementation of the ProblemRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{parse_datetime, parse_json_or_default, parse_optional_uuid, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Problem, ProblemStatus};
use crate::domain::ports::ProblemRepository;

/// SQLite-backed problem store.
pub struct SqliteProblemRepository {
    pool: SqlitePool,
}

impl SqliteProblemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProblemRepository for SqliteProblemRepository {
    async fn create(&self, problem: &Problem) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO problems (id, title, description, category, tags, status, vote_ids, selected_team_ids, created_by, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(problem.id.to_string())
        .bind(&problem.title)
        .bind(&problem.description)
        .bind(&problem.category)
        .bind(serde_json::to_string(&problem.tags)?)
        .bind(problem.status.as_str())
        .bind(serde_json::to_string(&problem.vote_ids)?)
        .bind(serde_json::to_string(&problem.selected_team_ids)?)
        .bind(problem.created_by.map(|id| id.to_string()))
        .bind(problem.created_at.to_rfc3339())
        .bind(problem.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Problem>> {
        let row: Option<ProblemRow> = sqlx::query_as("SELECT * FROM problems WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn attach_team(&self, problem_id: Uuid, team_id: Uuid) -> DomainResult<()> {
        let team = team_id.to_string();
        let result = sqlx::query(
            r#"UPDATE problems SET
                 selected_team_ids = CASE
                     WHEN EXISTS (SELECT 1 FROM json_each(problems.selected_team_ids) WHERE value = ?)
                     THEN selected_team_ids
                     ELSE json_insert(selected_team_ids, '$[#]', ?)
                 END,
                 status = CASE WHEN status = 'open' THEN 'in_progress' ELSE status END,
                 updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&team)
        .bind(&team)
        .bind(Utc::now().to_rfc3339())
        .bind(problem_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::ProblemNotFound(problem_id));
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ProblemRow {
    id: String,
    title: String,
    description: String,
    category: String,
    tags: Option<String>,
    status: String,
    vote_ids: Option<String>,
    selected_team_ids: Option<String>,
    created_by: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ProblemRow> for Problem {
    type Error = DomainError;

    fn try_from(row: ProblemRow) -> Result<Self, Self::Error> {
        let status = ProblemStatus::from_str(&row.status).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid problem status: {}", row.status))
        })?;

        Ok(Problem {
            id: parse_uuid(&row.id)?,
            title: row.title,
            description: row.description,
            category: row.category,
            tags: parse_json_or_default(row.tags)?,
            status,
            vote_ids: parse_json_or_default(row.vote_ids)?,
            selected_team_ids: parse_json_or_default(row.selected_team_ids)?,
            created_by: parse_optional_uuid(row.created_by)?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
