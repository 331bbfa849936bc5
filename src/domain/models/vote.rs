//! Vote domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of votes that closes voting on a problem and triggers team formation.
pub const VOTE_QUORUM: usize = 6;

/// One actor's vote for a problem. Unique per (problem, voter), never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: Uuid,
    pub problem_id: Uuid,
    pub voter_id: Uuid,
    pub cast_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(problem_id: Uuid, voter_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            problem_id,
            voter_id,
            cast_at: Utc::now(),
        }
    }
}

/// Snapshot of voting progress for a problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub problem_id: Uuid,
    pub votes: usize,
    pub quorum: usize,
    pub team_id: Option<Uuid>,
}

impl VoteTally {
    pub fn is_closed(&self) -> bool {
        self.votes >= self.quorum
    }

    pub fn remaining(&self) -> usize {
        self.quorum.saturating_sub(self.votes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_closed_at_quorum() {
        let mut tally = VoteTally {
            problem_id: Uuid::new_v4(),
            votes: 5,
            quorum: VOTE_QUORUM,
            team_id: None,
        };
        assert!(!tally.is_closed());
        assert_eq!(tally.remaining(), 1);

        tally.votes = 6;
        assert!(tally.is_closed());
        assert_eq!(tally.remaining(), 0);
    }
}
