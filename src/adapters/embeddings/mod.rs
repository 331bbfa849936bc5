//! Dense embedding provider adapters.

pub mod openai;

pub use openai::{OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};
