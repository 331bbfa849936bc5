//! Problem domain model.
//!
//! Problems are owned by the surrounding CRUD layer; the core only reads them
//! as ranking input and links formed teams back to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemStatus {
    /// Collecting votes
    Open,
    /// A team has been formed and is working on it
    InProgress,
    /// Solved and closed
    Completed,
}

impl Default for ProblemStatus {
    fn default() -> Self {
        Self::Open
    }
}

impl ProblemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "open" => Some(Self::Open),
            "in_progress" | "in-progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// A problem statement that contributors vote on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub status: ProblemStatus,
    /// Vote ids in the order they were recorded
    pub vote_ids: Vec<Uuid>,
    /// Teams linked to this problem
    pub selected_team_ids: Vec<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Problem {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            category: category.into(),
            tags: Vec::new(),
            status: ProblemStatus::Open,
            vote_ids: Vec::new(),
            selected_team_ids: Vec::new(),
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_creator(mut self, creator: Uuid) -> Self {
        self.created_by = Some(creator);
        self
    }

    /// Text the similarity engine compares voter profiles against.
    pub fn ranking_text(&self) -> String {
        format!("{} {} {}", self.title, self.description, self.category)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("problem title cannot be empty".to_string());
        }
        Ok(())
    }
}
