//! Team domain model.
//!
//! Teams are formed once per problem, either automatically when voting reaches
//! quorum or manually by an organizer, and own a shared workspace plus a
//! realtime channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a member inside a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Leader,
    Member,
}

/// A team member and their role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: Uuid,
    pub role: MemberRole,
}

/// Lifecycle status of a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamStatus {
    /// Working on the problem
    Active,
    /// Solution submitted, awaiting review
    Submitted,
    /// Solution reviewed
    Reviewed,
    /// Closed out
    Archived,
}

impl Default for TeamStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl TeamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Submitted => "submitted",
            Self::Reviewed => "reviewed",
            Self::Archived => "archived",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "submitted" => Some(Self::Submitted),
            "reviewed" => Some(Self::Reviewed),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    /// Check if transition to the new status is allowed.
    pub fn can_transition_to(&self, new_status: Self) -> bool {
        matches!(
            (self, new_status),
            (Self::Active, Self::Submitted)
                | (Self::Submitted, Self::Reviewed)
                // Review can send the team back to work or close it
                | (Self::Reviewed, Self::Active)
                | (Self::Reviewed, Self::Archived)
                | (Self::Active, Self::Archived)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Archived)
    }
}

/// How a team came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormationKind {
    /// Formed by the vote quorum
    Auto,
    /// Formed explicitly by an organizer
    Manual,
}

impl FormationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(Self::Auto),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

/// Work progress reported by a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamProgress {
    pub phase: String,
    /// 0..=100
    pub percentage: u8,
}

impl Default for TeamProgress {
    fn default() -> Self {
        Self {
            phase: "planning".to_string(),
            percentage: 0,
        }
    }
}

/// A team working on a problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub problem_id: Uuid,
    /// Ordered: the leader comes first
    pub members: Vec<TeamMember>,
    pub mentor_id: Option<Uuid>,
    pub status: TeamStatus,
    pub progress: TeamProgress,
    /// Realtime channel key, derived from the team id
    pub channel_id: String,
    pub formation: FormationKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Team {
    /// Create a team with `leader` first and the remaining members in order.
    pub fn new(
        name: impl Into<String>,
        problem_id: Uuid,
        leader: Uuid,
        members: impl IntoIterator<Item = Uuid>,
        formation: FormationKind,
    ) -> Self {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut roster = vec![TeamMember {
            user_id: leader,
            role: MemberRole::Leader,
        }];
        roster.extend(
            members
                .into_iter()
                .filter(|id| *id != leader)
                .map(|user_id| TeamMember {
                    user_id,
                    role: MemberRole::Member,
                }),
        );
        Self {
            id,
            name: name.into(),
            problem_id,
            members: roster,
            mentor_id: None,
            status: TeamStatus::Active,
            progress: TeamProgress::default(),
            channel_id: Self::channel_for(id),
            formation,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stable realtime channel key for a team id.
    pub fn channel_for(team_id: Uuid) -> String {
        format!("team:{team_id}")
    }

    pub fn leader(&self) -> Option<Uuid> {
        self.members
            .iter()
            .find(|m| m.role == MemberRole::Leader)
            .map(|m| m.user_id)
    }

    pub fn member_ids(&self) -> Vec<Uuid> {
        self.members.iter().map(|m| m.user_id).collect()
    }

    pub fn has_member(&self, user_id: Uuid) -> bool {
        self.members.iter().any(|m| m.user_id == user_id)
    }

    /// Transition to a new status, updating the timestamp.
    pub fn transition_to(&mut self, new_status: TeamStatus) -> Result<(), String> {
        if !self.status.can_transition_to(new_status) {
            return Err(format!(
                "Cannot transition from {} to {}",
                self.status.as_str(),
                new_status.as_str()
            ));
        }
        self.status = new_status;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_progress(&mut self, phase: impl Into<String>, percentage: u8) -> Result<(), String> {
        if percentage > 100 {
            return Err(format!("progress percentage must be 0-100, got {percentage}"));
        }
        self.progress = TeamProgress {
            phase: phase.into(),
            percentage,
        };
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_team_puts_leader_first() {
        let leader = Uuid::new_v4();
        let others: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let mut all = others.clone();
        all.insert(1, leader);

        let team = Team::new("T", Uuid::new_v4(), leader, all, FormationKind::Auto);
        assert_eq!(team.members.len(), 4);
        assert_eq!(team.leader(), Some(leader));
        assert_eq!(team.members[0].role, MemberRole::Leader);
        assert!(team.members[1..].iter().all(|m| m.role == MemberRole::Member));
        assert_eq!(team.channel_id, format!("team:{}", team.id));
    }

    #[test]
    fn test_status_lifecycle() {
        let mut team = Team::new("T", Uuid::new_v4(), Uuid::new_v4(), Vec::new(), FormationKind::Manual);
        assert!(team.transition_to(TeamStatus::Reviewed).is_err());
        team.transition_to(TeamStatus::Submitted).unwrap();
        team.transition_to(TeamStatus::Reviewed).unwrap();
        team.transition_to(TeamStatus::Active).unwrap();
        team.transition_to(TeamStatus::Archived).unwrap();
        assert!(team.status.is_terminal());
        assert!(team.transition_to(TeamStatus::Active).is_err());
    }

    #[test]
    fn test_progress_bounds() {
        let mut team = Team::new("T", Uuid::new_v4(), Uuid::new_v4(), Vec::new(), FormationKind::Manual);
        assert!(team.set_progress("build", 101).is_err());
        team.set_progress("build", 40).unwrap();
        assert_eq!(team.progress.percentage, 40);
    }
}
