//! SQLite implementation of the WorkspaceRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use super::{is_unique_violation, parse_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::workspace::{rewrite_prefix, split_full_path};
use crate::domain::models::{NodeType, WorkspaceNode};
use crate::domain::ports::WorkspaceRepository;

const SELECT_NODE: &str = "SELECT id, team_id, author_id, filename, path, node_type, language, content, created_at, updated_at FROM workspace_nodes";

// `path = ? OR substr(path, 1, ?) = ?` anchors the prefix on a '/' boundary
// without LIKE wildcards, so "abc" never matches "abcdef".
const WITHIN_CLAUSE: &str = "team_id = ? AND (path = ? OR substr(path, 1, ?) = ?)";

/// SQLite-backed workspace hierarchy.
pub struct SqliteWorkspaceRepository {
    pool: SqlitePool,
}

impl SqliteWorkspaceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn descendants_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        team_id: Uuid,
        folder_full_path: &str,
    ) -> DomainResult<Vec<(String, String)>> {
        let rows: Vec<(String, String)> = sqlx::query_as(&format!(
            "SELECT id, path FROM workspace_nodes WHERE {WITHIN_CLAUSE}"
        ))
        .bind(team_id.to_string())
        .bind(folder_full_path)
        .bind(prefix_len(folder_full_path))
        .bind(format!("{folder_full_path}/"))
        .fetch_all(&mut **tx)
        .await?;
        Ok(rows)
    }
}

/// Character length of `prefix/`, as SQLite's substr counts characters.
fn prefix_len(prefix: &str) -> i64 {
    i64::try_from(prefix.chars().count() + 1).unwrap_or(i64::MAX)
}

fn conflict(node: &WorkspaceNode) -> DomainError {
    DomainError::PathConflict {
        team_id: node.team_id,
        full_path: node.full_path(),
    }
}

#[async_trait]
impl WorkspaceRepository for SqliteWorkspaceRepository {
    async fn insert(&self, node: &WorkspaceNode) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO workspace_nodes (id, team_id, author_id, filename, path, node_type, language, content, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(node.id.to_string())
        .bind(node.team_id.to_string())
        .bind(node.author_id.to_string())
        .bind(&node.filename)
        .bind(&node.path)
        .bind(node.node_type.as_str())
        .bind(&node.language)
        .bind(&node.content)
        .bind(node.created_at.to_rfc3339())
        .bind(node.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| if is_unique_violation(&e) { conflict(node) } else { e.into() })?;

        Ok(())
    }

    async fn update_content(&self, node: &WorkspaceNode) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE workspace_nodes SET content = ?, language = ?, author_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&node.content)
        .bind(&node.language)
        .bind(node.author_id.to_string())
        .bind(node.updated_at.to_rfc3339())
        .bind(node.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NodeNotFound(node.id));
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<WorkspaceNode>> {
        let row: Option<NodeRow> = sqlx::query_as(&format!("{SELECT_NODE} WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_path(
        &self,
        team_id: Uuid,
        path: &str,
        filename: &str,
    ) -> DomainResult<Option<WorkspaceNode>> {
        let row: Option<NodeRow> = sqlx::query_as(&format!(
            "{SELECT_NODE} WHERE team_id = ? AND path = ? AND filename = ?"
        ))
        .bind(team_id.to_string())
        .bind(path)
        .bind(filename)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_by_team(&self, team_id: Uuid) -> DomainResult<Vec<WorkspaceNode>> {
        let rows: Vec<NodeRow> = sqlx::query_as(&format!(
            "{SELECT_NODE} WHERE team_id = ? ORDER BY path, filename"
        ))
        .bind(team_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn relocate(&self, node: &WorkspaceNode, old_full: &str, new_full: &str) -> DomainResult<u64> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE workspace_nodes SET path = ?, filename = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&node.path)
        .bind(&node.filename)
        .bind(node.updated_at.to_rfc3339())
        .bind(node.id.to_string())
        .execute(&mut *tx)
        .await;

        match result {
            Ok(r) if r.rows_affected() == 0 => {
                tx.rollback().await?;
                return Err(DomainError::NodeNotFound(node.id));
            }
            Ok(_) => {}
            Err(e) => {
                tx.rollback().await?;
                return Err(if is_unique_violation(&e) { conflict(node) } else { e.into() });
            }
        }

        let mut rewritten = 0u64;
        if node.node_type == NodeType::Folder && !old_full.is_empty() {
            let now = Utc::now().to_rfc3339();
            let descendants = Self::descendants_in_tx(&mut tx, node.team_id, old_full).await?;
            for (id, path) in descendants {
                let Some(new_path) = rewrite_prefix(&path, old_full, new_full) else {
                    continue;
                };
                let updated = sqlx::query(
                    "UPDATE workspace_nodes SET path = ?, updated_at = ? WHERE id = ?",
                )
                .bind(&new_path)
                .bind(&now)
                .bind(&id)
                .execute(&mut *tx)
                .await;

                if let Err(e) = updated {
                    tx.rollback().await?;
                    return Err(if is_unique_violation(&e) {
                        DomainError::PathConflict {
                            team_id: node.team_id,
                            full_path: new_path,
                        }
                    } else {
                        e.into()
                    });
                }
                rewritten += 1;
            }
        }

        tx.commit().await?;
        Ok(rewritten)
    }

    async fn delete_subtree(&self, node: &WorkspaceNode) -> DomainResult<Vec<Uuid>> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM workspace_nodes WHERE id = ?")
            .bind(node.id.to_string())
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(DomainError::NodeNotFound(node.id));
        }

        let mut removed = vec![node.id];
        if node.is_folder() {
            let full_path = node.full_path();
            let descendants = Self::descendants_in_tx(&mut tx, node.team_id, &full_path).await?;
            sqlx::query(&format!("DELETE FROM workspace_nodes WHERE {WITHIN_CLAUSE}"))
                .bind(node.team_id.to_string())
                .bind(&full_path)
                .bind(prefix_len(&full_path))
                .bind(format!("{full_path}/"))
                .execute(&mut *tx)
                .await?;
            for (id, _) in descendants {
                removed.push(parse_uuid(&id)?);
            }
        }

        tx.commit().await?;
        Ok(removed)
    }

    async fn delete_file(&self, node: &WorkspaceNode) -> DomainResult<Vec<Uuid>> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM workspace_nodes WHERE id = ? AND node_type = 'file'")
            .bind(node.id.to_string())
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(DomainError::NodeNotFound(node.id));
        }

        let mut removed = vec![node.id];
        if !node.path.is_empty() {
            // Any deeper node implies a direct child folder, so direct children suffice
            let (remaining,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM workspace_nodes WHERE team_id = ? AND path = ?")
                    .bind(node.team_id.to_string())
                    .bind(&node.path)
                    .fetch_one(&mut *tx)
                    .await?;

            if remaining == 0 {
                let (parent_path, parent_name) = split_full_path(&node.path);
                let parent: Option<(String,)> = sqlx::query_as(
                    "SELECT id FROM workspace_nodes WHERE team_id = ? AND path = ? AND filename = ? AND node_type = 'folder'",
                )
                .bind(node.team_id.to_string())
                .bind(parent_path)
                .bind(parent_name)
                .fetch_optional(&mut *tx)
                .await?;

                if let Some((parent_id,)) = parent {
                    sqlx::query("DELETE FROM workspace_nodes WHERE id = ?")
                        .bind(&parent_id)
                        .execute(&mut *tx)
                        .await?;
                    removed.push(parse_uuid(&parent_id)?);
                }
            }
        }

        tx.commit().await?;
        Ok(removed)
    }
}

#[derive(sqlx::FromRow)]
struct NodeRow {
    id: String,
    team_id: String,
    author_id: String,
    filename: String,
    path: String,
    node_type: String,
    language: Option<String>,
    content: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<NodeRow> for WorkspaceNode {
    type Error = DomainError;

    fn try_from(row: NodeRow) -> Result<Self, Self::Error> {
        let node_type = NodeType::from_str(&row.node_type).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid node type: {}", row.node_type))
        })?;

        Ok(WorkspaceNode {
            id: parse_uuid(&row.id)?,
            team_id: parse_uuid(&row.team_id)?,
            author_id: parse_uuid(&row.author_id)?,
            filename: row.filename,
            path: row.path,
            node_type,
            language: row.language,
            content: row.content,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
