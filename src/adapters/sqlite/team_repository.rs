//! SQLite implementation of the TeamRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{
    is_foreign_key_violation, is_unique_violation, parse_datetime, parse_json_or_default,
    parse_optional_uuid, parse_uuid,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{FormationKind, Team, TeamProgress, TeamStatus};
use crate::domain::ports::TeamRepository;

/// SQLite-backed team store; members are kept as a JSON column.
pub struct SqliteTeamRepository {
    pool: SqlitePool,
}

impl SqliteTeamRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TeamRepository for SqliteTeamRepository {
    async fn create(&self, team: &Team) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO teams (id, name, problem_id, members, mentor_id, status, progress_phase, progress_percentage, channel_id, formation, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(team.id.to_string())
        .bind(&team.name)
        .bind(team.problem_id.to_string())
        .bind(serde_json::to_string(&team.members)?)
        .bind(team.mentor_id.map(|id| id.to_string()))
        .bind(team.status.as_str())
        .bind(&team.progress.phase)
        .bind(i64::from(team.progress.percentage))
        .bind(&team.channel_id)
        .bind(team.formation.as_str())
        .bind(team.created_at.to_rfc3339())
        .bind(team.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::FormationRaceLost(team.problem_id)
            } else if is_foreign_key_violation(&e) {
                DomainError::ProblemNotFound(team.problem_id)
            } else {
                e.into()
            }
        })?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Team>> {
        let row: Option<TeamRow> = sqlx::query_as("SELECT * FROM teams WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_by_problem(&self, problem_id: Uuid) -> DomainResult<Vec<Team>> {
        let rows: Vec<TeamRow> =
            sqlx::query_as("SELECT * FROM teams WHERE problem_id = ? ORDER BY created_at")
                .bind(problem_id.to_string())
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_for_member(&self, user_id: Uuid) -> DomainResult<Vec<Team>> {
        let rows: Vec<TeamRow> = sqlx::query_as(
            r#"SELECT * FROM teams
               WHERE EXISTS (
                   SELECT 1 FROM json_each(teams.members)
                   WHERE json_extract(value, '$.user_id') = ?
               )
               ORDER BY created_at"#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update(&self, team: &Team) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE teams SET name = ?, members = ?, mentor_id = ?, status = ?, progress_phase = ?, progress_percentage = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&team.name)
        .bind(serde_json::to_string(&team.members)?)
        .bind(team.mentor_id.map(|id| id.to_string()))
        .bind(team.status.as_str())
        .bind(&team.progress.phase)
        .bind(i64::from(team.progress.percentage))
        .bind(team.updated_at.to_rfc3339())
        .bind(team.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::TeamNotFound(team.id));
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct TeamRow {
    id: String,
    name: String,
    problem_id: String,
    members: Option<String>,
    mentor_id: Option<String>,
    status: String,
    progress_phase: String,
    progress_percentage: i64,
    channel_id: String,
    formation: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<TeamRow> for Team {
    type Error = DomainError;

    fn try_from(row: TeamRow) -> Result<Self, Self::Error> {
        let status = TeamStatus::from_str(&row.status).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid team status: {}", row.status))
        })?;
        let formation = FormationKind::from_str(&row.formation).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid formation: {}", row.formation))
        })?;
        let percentage = u8::try_from(row.progress_percentage).map_err(|_| {
            DomainError::SerializationError(format!(
                "Invalid progress percentage: {}",
                row.progress_percentage
            ))
        })?;

        Ok(Team {
            id: parse_uuid(&row.id)?,
            name: row.name,
            problem_id: parse_uuid(&row.problem_id)?,
            members: parse_json_or_default(row.members)?,
            mentor_id: parse_optional_uuid(row.mentor_id)?,
            status,
            progress: TeamProgress {
                phase: row.progress_phase,
                percentage,
            },
            channel_id: row.channel_id,
            formation,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteProblemRepository};
    use crate::domain::models::Problem;
    use crate::domain::ports::ProblemRepository;

    async fn setup() -> (SqliteTeamRepository, Problem) {
        let pool = create_migrated_test_pool().await.unwrap();
        let problem = Problem::new("Transit", "Bus tracking", "mobility");
        SqliteProblemRepository::new(pool.clone())
            .create(&problem)
            .await
            .unwrap();
        (SqliteTeamRepository::new(pool), problem)
    }

    #[tokio::test]
    async fn test_create_and_list_for_member() {
        let (repo, problem) = setup().await;
        let leader = Uuid::new_v4();
        let member = Uuid::new_v4();
        let team = Team::new("Transit Team", problem.id, leader, vec![member], FormationKind::Auto);
        repo.create(&team).await.unwrap();

        let stored = repo.get(team.id).await.unwrap().unwrap();
        assert_eq!(stored.leader(), Some(leader));
        assert_eq!(stored.members.len(), 2);

        let for_member = repo.list_for_member(member).await.unwrap();
        assert_eq!(for_member.len(), 1);
        assert!(repo.list_for_member(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_auto_team_loses_race() {
        let (repo, problem) = setup().await;
        let first = Team::new("A", problem.id, Uuid::new_v4(), Vec::new(), FormationKind::Auto);
        let second = Team::new("B", problem.id, Uuid::new_v4(), Vec::new(), FormationKind::Auto);
        repo.create(&first).await.unwrap();

        let err = repo.create(&second).await.unwrap_err();
        assert!(matches!(err, DomainError::FormationRaceLost(id) if id == problem.id));

        // Manual teams are not limited
        let manual = Team::new("C", problem.id, Uuid::new_v4(), Vec::new(), FormationKind::Manual);
        repo.create(&manual).await.unwrap();
        assert_eq!(repo.list_by_problem(problem.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_progress_and_status() {
        let (repo, problem) = setup().await;
        let mut team = Team::new("A", problem.id, Uuid::new_v4(), Vec::new(), FormationKind::Manual);
        repo.create(&team).await.unwrap();

        team.set_progress("building", 40).unwrap();
        team.transition_to(TeamStatus::Submitted).unwrap();
        repo.update(&team).await.unwrap();

        let stored = repo.get(team.id).await.unwrap().unwrap();
        assert_eq!(stored.progress.percentage, 40);
        assert_eq!(stored.status, TeamStatus::Submitted);
    }
}
