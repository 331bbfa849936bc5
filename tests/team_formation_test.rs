//! Integration tests for vote-driven team formation.

mod common;

use std::sync::Arc;

use futures::future::join_all;

use teamspace::adapters::sqlite::{SqliteProblemRepository, SqliteProfileRepository, SqliteTeamRepository};
use teamspace::domain::models::{FormationKind, MemberRole, ProblemStatus, VOTE_QUORUM};
use teamspace::domain::ports::{ProblemRepository, ProfileRepository, TeamRepository};
use teamspace::services::{EventBus, EventPayload, SimilarityEngine};
use teamspace::DomainError;

#[tokio::test]
async fn test_concurrent_votes_form_exactly_one_team() {
    let pool = common::pool().await;
    let problem = common::seed_problem(&pool, "Air quality", "low cost sensors", &["iot"]).await;
    let mut voters = Vec::new();
    for i in 0..VOTE_QUORUM {
        voters.push(common::seed_contributor(&pool, &format!("v{i}"), "", &[]).await);
    }

    let service = Arc::new(common::formation(
        &pool,
        SimilarityEngine::local(),
        Arc::new(EventBus::default()),
    ));
    let problem_id = problem.id;
    let results = join_all(voters.iter().map(|voter| {
        let service = service.clone();
        let voter = *voter;
        async move { service.cast_vote(problem_id, voter).await }
    }))
    .await;

    let outcomes: Vec<_> = results.into_iter().map(Result::unwrap).collect();
    let formed: Vec<_> = outcomes.iter().filter_map(|o| o.team.as_ref()).collect();
    assert_eq!(formed.len(), 1, "exactly one vote completes the quorum");

    let teams = SqliteTeamRepository::new(pool.clone())
        .list_by_problem(problem.id)
        .await
        .unwrap();
    assert_eq!(teams.len(), 1);

    let mut members = teams[0].member_ids();
    members.sort();
    let mut expected = voters.clone();
    expected.sort();
    assert_eq!(members, expected);
}

#[tokio::test]
async fn test_duplicate_vote_is_conflict_and_count_unchanged() {
    let pool = common::pool().await;
    let problem = common::seed_problem(&pool, "Food banks", "", &[]).await;
    let voter = common::seed_contributor(&pool, "v", "", &[]).await;
    let service = common::formation(&pool, SimilarityEngine::local(), Arc::new(EventBus::default()));

    service.cast_vote(problem.id, voter).await.unwrap();
    let err = service.cast_vote(problem.id, voter).await.unwrap_err();
    assert!(matches!(err, DomainError::DuplicateVote { .. }));
    assert!(err.is_conflict());

    assert_eq!(service.vote_status(problem.id).await.unwrap().votes, 1);
}

#[tokio::test]
async fn test_best_match_leads_and_voting_closes() {
    common::setup_test_logging();
    let pool = common::pool().await;
    let problem = common::seed_problem(
        &pool,
        "Solar mapping",
        "map rooftop solar potential across the city",
        &["solar", "gis"],
    )
    .await;

    let bios = [
        ("v1", "watercolor painter", vec!["art"]),
        ("v2", "pastry chef", vec!["baking"]),
        ("v3", "gis analyst mapping rooftop solar potential", vec!["solar", "gis"]),
        ("v4", "jazz drummer", vec!["music"]),
        ("v5", "marathon runner", vec!["sports"]),
        ("v6", "chess coach", vec!["games"]),
    ];
    let mut voters = Vec::new();
    for (name, bio, skills) in &bios {
        voters.push(common::seed_contributor(&pool, name, bio, skills).await);
    }

    let events = Arc::new(EventBus::default());
    let mut rx = events.subscribe();
    let service = common::formation(&pool, SimilarityEngine::local(), events);

    let mut formed = None;
    for voter in &voters {
        let outcome = service.cast_vote(problem.id, *voter).await.unwrap();
        if outcome.team.is_some() {
            formed = outcome.team;
        }
    }
    let team = formed.expect("sixth vote forms the team");

    assert_eq!(team.leader(), Some(voters[2]));
    assert_eq!(team.members.len(), 6);
    assert_eq!(team.members.iter().filter(|m| m.role == MemberRole::Leader).count(), 1);
    assert_eq!(team.formation, FormationKind::Auto);
    // Zero-score voters keep arrival order behind the leader
    assert_eq!(
        team.member_ids(),
        vec![voters[2], voters[0], voters[1], voters[3], voters[4], voters[5]]
    );

    let stored = SqliteProblemRepository::new(pool.clone())
        .get(problem.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, ProblemStatus::InProgress);
    assert_eq!(stored.selected_team_ids, vec![team.id]);

    let profiles = SqliteProfileRepository::new(pool.clone());
    for voter in &voters {
        let profile = profiles.get(*voter).await.unwrap().unwrap();
        assert_eq!(profile.team_ids, vec![team.id]);
    }

    let late = common::seed_contributor(&pool, "v7", "", &[]).await;
    let err = service.cast_vote(problem.id, late).await.unwrap_err();
    assert!(matches!(err, DomainError::VotingClosed { votes: 6, .. }));

    let mut saw_formed = false;
    while let Ok(event) = rx.try_recv() {
        if let EventPayload::TeamFormed { leader_id, .. } = event.payload {
            assert_eq!(leader_id, voters[2]);
            saw_formed = true;
        }
    }
    assert!(saw_formed);
}

#[tokio::test]
async fn test_reconcile_is_idempotent_after_formation() {
    let pool = common::pool().await;
    let problem = common::seed_problem(&pool, "Transit", "", &[]).await;
    let service = common::formation(&pool, SimilarityEngine::local(), Arc::new(EventBus::default()));

    for i in 0..VOTE_QUORUM {
        let voter = common::seed_contributor(&pool, &format!("v{i}"), "", &[]).await;
        service.cast_vote(problem.id, voter).await.unwrap();
    }
    let team_id = service.vote_status(problem.id).await.unwrap().team_id.unwrap();

    let again = service.reconcile(problem.id).await.unwrap().unwrap();
    assert_eq!(again.id, team_id);

    let stored = SqliteProblemRepository::new(pool.clone())
        .get(problem.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.selected_team_ids, vec![team_id]);
}

#[tokio::test]
async fn test_vote_on_unknown_problem() {
    let pool = common::pool().await;
    let service = common::formation(&pool, SimilarityEngine::local(), Arc::new(EventBus::default()));
    let err = service
        .cast_vote(uuid::Uuid::new_v4(), uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
