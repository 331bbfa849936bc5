//! Infrastructure adapters for external systems.

pub mod cache;
pub mod embeddings;
pub mod realtime;
pub mod sqlite;
