//! Actor profile domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Platform role of an authenticated actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Contributor,
    Mentor,
    Admin,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contributor => "contributor",
            Self::Mentor => "mentor",
            Self::Admin => "admin",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "contributor" => Some(Self::Contributor),
            "mentor" => Some(Self::Mentor),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Profile of an actor, used as ranking input for team formation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub role: ActorRole,
    pub bio: String,
    pub skills: Vec<String>,
    /// Teams this actor has been placed in
    pub team_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(name: impl Into<String>, role: ActorRole) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            role,
            bio: String::new(),
            skills: Vec::new(),
            team_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn contributor(name: impl Into<String>) -> Self {
        Self::new(name, ActorRole::Contributor)
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = bio.into();
        self
    }

    pub fn with_skills(mut self, skills: Vec<String>) -> Self {
        self.skills = skills;
        self
    }

    pub fn is_contributor(&self) -> bool {
        self.role == ActorRole::Contributor
    }
}
