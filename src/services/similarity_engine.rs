//! Similarity engine.
//!
//! Turns free text plus tags into an [`EmbeddingVector`] and scores pairs of
//! vectors. A dense provider is tried first; any failure, an empty result, or
//! a missing provider falls back to the local token-count vector, so `embed`
//! never fails.

use std::cmp::Ordering;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::models::{similarity, EmbeddingVector};
use crate::domain::ports::EmbeddingProvider;

/// A candidate to rank against a target text.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: Uuid,
    /// Free text compared against the target
    pub text: String,
    /// Skills or tags folded into the token vector
    pub tags: Vec<String>,
    /// Position in arrival order; lower wins ties
    pub order: usize,
}

/// A candidate with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub id: Uuid,
    /// Cosine similarity in [0, 1]
    pub score: f64,
    pub order: usize,
}

/// Ranks candidates by cosine similarity to a target.
pub struct SimilarityEngine {
    /// Usually a `CachedEmbeddingProvider`; `None` means local vectors only
    provider: Option<Arc<dyn EmbeddingProvider>>,
}

impl SimilarityEngine {
    /// Engine over an optional dense provider.
    pub fn new(provider: Option<Arc<dyn EmbeddingProvider>>) -> Self {
        Self { provider }
    }

    /// Engine that only uses local token-count vectors.
    pub fn local() -> Self {
        Self { provider: None }
    }

    /// Name of the active provider.
    pub fn provider_name(&self) -> &'static str {
        self.provider.as_ref().map_or("local", |p| p.name())
    }

    /// Embed text and tags, falling back to the sparse representation.
    pub async fn embed(&self, text: &str, tags: &[String]) -> EmbeddingVector {
        if let Some(provider) = &self.provider {
            let input = provider_input(text, tags);
            match provider.embed(&input).await {
                Ok(values) if !values.is_empty() => return EmbeddingVector::Dense(values),
                Ok(_) => {
                    debug!(provider = provider.name(), "provider returned no vector, using token fallback");
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "embedding provider failed, using token fallback");
                }
            }
        }
        EmbeddingVector::from_tokens(text, tags)
    }

    /// Score two optional vectors; see [`similarity`].
    pub fn similarity(a: Option<&EmbeddingVector>, b: Option<&EmbeddingVector>) -> f64 {
        similarity(a, b)
    }

    /// Rank candidates by similarity to the target, best first.
    ///
    /// Ties keep arrival order. When the provider answers for some texts but
    /// not others, every vector is recomputed locally so all scores share one
    /// representation.
    pub async fn rank(
        &self,
        target_text: &str,
        target_tags: &[String],
        candidates: Vec<Candidate>,
    ) -> Vec<RankedCandidate> {
        let target = self.embed(target_text, target_tags);
        let voters = join_all(candidates.iter().map(|c| self.embed(&c.text, &c.tags)));
        let (mut target, mut vectors) = futures::join!(target, voters);

        let dense = target.is_dense();
        if vectors.iter().any(|v| v.is_dense() != dense) {
            debug!("mixed embedding representations, ranking with token vectors");
            target = EmbeddingVector::from_tokens(target_text, target_tags);
            vectors = candidates
                .iter()
                .map(|c| EmbeddingVector::from_tokens(&c.text, &c.tags))
                .collect();
        }

        let mut ranked: Vec<RankedCandidate> = candidates
            .iter()
            .zip(&vectors)
            .map(|(candidate, vector)| RankedCandidate {
                id: candidate.id,
                score: similarity(Some(&target), Some(vector)),
                order: candidate.order,
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.order.cmp(&b.order))
        });
        ranked
    }
}

/// Text sent to a dense provider: the text followed by its tags.
fn provider_input(text: &str, tags: &[String]) -> String {
    if tags.is_empty() {
        return text.to_string();
    }
    format!("{} {}", text.trim(), tags.join(" "))
}
