//! SQLite implementation of the VoteRepository.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{is_foreign_key_violation, is_unique_violation, parse_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Vote;
use crate::domain::ports::VoteRepository;

/// SQLite-backed vote store.
pub struct SqliteVoteRepository {
    pool: SqlitePool,
}

impl SqliteVoteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoteRepository for SqliteVoteRepository {
    async fn record(&self, vote: &Vote) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;

        // Fixed-width timestamps keep lexical order equal to time order
        let inserted = sqlx::query(
            "INSERT INTO votes (id, problem_id, voter_id, cast_at) VALUES (?, ?, ?, ?)",
        )
        .bind(vote.id.to_string())
        .bind(vote.problem_id.to_string())
        .bind(vote.voter_id.to_string())
        .bind(vote.cast_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            tx.rollback().await?;
            return Err(if is_unique_violation(&e) {
                DomainError::DuplicateVote {
                    problem_id: vote.problem_id,
                    voter_id: vote.voter_id,
                }
            } else if is_foreign_key_violation(&e) {
                DomainError::ProblemNotFound(vote.problem_id)
            } else {
                e.into()
            });
        }

        let updated = sqlx::query(
            "UPDATE problems SET vote_ids = json_insert(vote_ids, '$[#]', ?), updated_at = ? WHERE id = ?",
        )
        .bind(vote.id.to_string())
        .bind(Utc::now().to_rfc3339())
        .bind(vote.problem_id.to_string())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(DomainError::ProblemNotFound(vote.problem_id));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn exists(&self, problem_id: Uuid, voter_id: Uuid) -> DomainResult<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM votes WHERE problem_id = ? AND voter_id = ?")
                .bind(problem_id.to_string())
                .bind(voter_id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    async fn count_for_problem(&self, problem_id: Uuid) -> DomainResult<usize> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM votes WHERE problem_id = ?")
            .bind(problem_id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    async fn earliest_for_problem(&self, problem_id: Uuid, limit: usize) -> DomainResult<Vec<Vote>> {
        let rows: Vec<VoteRow> = sqlx::query_as(
            "SELECT id, problem_id, voter_id, cast_at FROM votes WHERE problem_id = ? ORDER BY cast_at, seq LIMIT ?",
        )
        .bind(problem_id.to_string())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct VoteRow {
    id: String,
    problem_id: String,
    voter_id: String,
    cast_at: String,
}

impl TryFrom<VoteRow> for Vote {
    type Error = DomainError;

    fn try_from(row: VoteRow) -> Result<Self, Self::Error> {
        Ok(Vote {
            id: parse_uuid(&row.id)?,
            problem_id: parse_uuid(&row.problem_id)?,
            voter_id: parse_uuid(&row.voter_id)?,
            cast_at: parse_datetime(&row.cast_at)?,
        })
    }
}
