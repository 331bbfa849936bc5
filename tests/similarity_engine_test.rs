//! Similarity engine behavior across providers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockito::Server;
use uuid::Uuid;

use teamspace::adapters::cache::CachedEmbeddingProvider;
use teamspace::adapters::embeddings::{OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};
use teamspace::domain::models::EmbeddingVector;
use teamspace::domain::ports::EmbeddingProvider;
use teamspace::services::{Candidate, SimilarityEngine};
use teamspace::DomainResult;

/// Two-axis vectors: "solar" and "music", plus a bias term.
struct KeywordProvider {
    calls: AtomicUsize,
    /// Texts containing this word get no vector
    blind_spot: Option<&'static str>,
}

impl KeywordProvider {
    fn new(blind_spot: Option<&'static str>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            blind_spot,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordProvider {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn dimension(&self) -> usize {
        3
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = text.to_lowercase();
        if self.blind_spot.is_some_and(|word| text.contains(word)) {
            return Ok(Vec::new());
        }
        let axis = |word: &str| if text.contains(word) { 1.0 } else { 0.0 };
        Ok(vec![axis("solar"), axis("music"), 0.1])
    }
}

fn candidate(text: &str, order: usize) -> Candidate {
    Candidate {
        id: Uuid::new_v4(),
        text: text.to_string(),
        tags: Vec::new(),
        order,
    }
}

#[tokio::test]
async fn test_identical_vectors_score_one_and_absent_scores_zero() {
    let v = EmbeddingVector::from_tokens("map rooftop solar", &["gis".to_string()]);
    let score = SimilarityEngine::similarity(Some(&v), Some(&v));
    assert!((score - 1.0).abs() < 1e-9);
    assert_eq!(SimilarityEngine::similarity(Some(&v), None), 0.0);
    assert_eq!(SimilarityEngine::similarity(None, None), 0.0);

    let dense = EmbeddingVector::Dense(vec![1.0, 0.0]);
    assert_eq!(SimilarityEngine::similarity(Some(&dense), Some(&v)), 0.0);
}

#[tokio::test]
async fn test_dense_provider_drives_ranking() {
    let engine = SimilarityEngine::new(Some(Arc::new(KeywordProvider::new(None))));
    assert_eq!(engine.provider_name(), "keyword");

    let musician = candidate("session music producer", 0);
    let engineer = candidate("solar installer", 1);
    let engineer_id = engineer.id;

    let ranked = engine
        .rank("Community solar", &[], vec![musician, engineer])
        .await;
    assert_eq!(ranked[0].id, engineer_id);
    assert!(ranked[0].score > ranked[1].score);
}

#[tokio::test]
async fn test_mixed_representations_fall_back_to_tokens() {
    let engine = SimilarityEngine::new(Some(Arc::new(KeywordProvider::new(Some("offline")))));

    // The provider cannot see the second candidate, so everything is re-scored
    // on token vectors where "rooftop" is the only shared word.
    let first = candidate("music teacher", 0);
    let second = candidate("offline rooftop surveys", 1);
    let second_id = second.id;

    let ranked = engine
        .rank("rooftop panels", &[], vec![first, second])
        .await;
    assert_eq!(ranked[0].id, second_id);
    assert!(ranked[0].score > 0.0);
    assert_eq!(ranked[1].score, 0.0);
}

#[tokio::test]
async fn test_ties_keep_arrival_order() {
    let engine = SimilarityEngine::local();
    let candidates: Vec<_> = (0..4).map(|i| candidate("unrelated", i)).collect();
    let ids: Vec<_> = candidates.iter().map(|c| c.id).collect();

    let ranked = engine.rank("solar", &[], candidates).await;
    assert_eq!(ranked.iter().map(|r| r.id).collect::<Vec<_>>(), ids);
}

#[tokio::test]
async fn test_failing_remote_provider_falls_back() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/embeddings")
        .with_status(401)
        .with_body("unauthorized")
        .create_async()
        .await;

    let remote = OpenAiEmbeddingProvider::new(OpenAiEmbeddingConfig {
        api_key: Some("test-key".to_string()),
        base_url: server.url(),
        max_retry_secs: 1,
        ..Default::default()
    })
    .unwrap();
    let engine = SimilarityEngine::new(Some(Arc::new(remote)));

    let vector = engine.embed("solar mapping", &[]).await;
    assert!(!vector.is_dense());
    assert_eq!(vector.len(), 2);
}

#[tokio::test]
async fn test_cached_provider_embeds_each_text_once() {
    let inner = Arc::new(KeywordProvider::new(None));
    let cached = CachedEmbeddingProvider::with_limits(inner.clone(), 100, Duration::from_secs(60));
    let engine = SimilarityEngine::new(Some(Arc::new(cached)));

    let first = engine.embed("solar farm", &[]).await;
    let second = engine.embed("solar farm", &[]).await;
    assert_eq!(first, second);
    assert!(first.is_dense());
    assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
}
