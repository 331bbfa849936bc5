//! Cached wrapper for EmbeddingProvider using a moka TTL cache.
//!
//! Profile and problem texts change rarely, so vectors are cached by the
//! SHA-256 of the exact text. Empty vectors and errors are never cached.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use sha2::{Digest, Sha256};
use tracing::trace;

use crate::domain::errors::DomainResult;
use crate::domain::ports::EmbeddingProvider;

/// Default TTL for cached vectors.
const EMBEDDING_CACHE_TTL_SECS: u64 = 3600;

/// Default maximum number of cached vectors.
const EMBEDDING_CACHE_MAX_CAPACITY: u64 = 10_000;

/// Cached embedding provider decorator.
pub struct CachedEmbeddingProvider {
    inner: Arc<dyn EmbeddingProvider>,
    vectors: Cache<String, Arc<Vec<f32>>>,
}

impl CachedEmbeddingProvider {
    pub fn new(inner: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_limits(
            inner,
            EMBEDDING_CACHE_MAX_CAPACITY,
            Duration::from_secs(EMBEDDING_CACHE_TTL_SECS),
        )
    }

    pub fn with_limits(inner: Arc<dyn EmbeddingProvider>, capacity: u64, ttl: Duration) -> Self {
        let vectors = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self { inner, vectors }
    }

    /// Number of cached vectors (approximate until pending tasks run).
    pub fn entry_count(&self) -> u64 {
        self.vectors.entry_count()
    }
}

/// Content address of a text, hex-encoded SHA-256.
pub fn text_digest(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

#[async_trait]
impl EmbeddingProvider for CachedEmbeddingProvider {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        let key = text_digest(text);
        if let Some(cached) = self.vectors.get(&key).await {
            trace!(key = %key, "embedding cache hit");
            return Ok(cached.as_ref().clone());
        }

        let vector = self.inner.embed(text).await?;
        if !vector.is_empty() {
            self.vectors.insert(key, Arc::new(vector.clone())).await;
        }
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[String]) -> DomainResult<Vec<Vec<f32>>> {
        let mut results: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut missing = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            match self.vectors.get(&text_digest(text)).await {
                Some(cached) => results.push(Some(cached.as_ref().clone())),
                None => {
                    results.push(None);
                    missing.push(i);
                }
            }
        }

        if !missing.is_empty() {
            let to_embed: Vec<String> = missing.iter().map(|&i| texts[i].clone()).collect();
            let fresh = self.inner.embed_batch(&to_embed).await?;
            for (&i, vector) in missing.iter().zip(fresh) {
                if !vector.is_empty() {
                    self.vectors
                        .insert(text_digest(&texts[i]), Arc::new(vector.clone()))
                        .await;
                }
                results[i] = Some(vector);
            }
        }

        Ok(results.into_iter().map(Option::unwrap_or_default).collect())
    }
}
