//! Embedding provider port.
//!
//! Providers turn a problem or profile's text into a dense vector. The
//! similarity engine falls back to a sparse token vector whenever a provider
//! is absent, fails, or returns nothing.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// Trait for dense text embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name (e.g. "openai", "null").
    fn name(&self) -> &'static str;

    /// Vector dimension produced by the configured model, 0 when unknown.
    fn dimension(&self) -> usize;

    /// Embed a single text. An empty vector means "no embedding available".
    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>>;

    /// Embed several texts, preserving input order.
    async fn embed_batch(&self, texts: &[String]) -> DomainResult<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}
