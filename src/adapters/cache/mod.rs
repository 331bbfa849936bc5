//! In-memory caching decorators.
//!
//! Uses `moka` for TTL-based concurrent caching around port traits.

pub mod cached_embedding_provider;

pub use cached_embedding_provider::{text_digest, CachedEmbeddingProvider};
