//! Embedding vector domain model.
//!
//! Two representations exist: dense vectors produced by an external embedding
//! model, and sparse token-count maps produced by the local fallback. Both are
//! compared through [`similarity`], which dispatches on the variant.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A comparable text representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum EmbeddingVector {
    /// Output of an external embedding model
    Dense(Vec<f32>),
    /// Token occurrence counts from the local tokenizer
    Sparse(BTreeMap<String, u32>),
}

impl EmbeddingVector {
    /// Build a sparse vector from free text and tags.
    ///
    /// Text is lower-cased, non-alphanumeric characters are dropped, and the
    /// remainder is split on whitespace. Tags go through the same
    /// normalization and are counted alongside the text tokens.
    pub fn from_tokens(text: &str, tags: &[String]) -> Self {
        let mut counts = BTreeMap::new();
        for token in tokenize(text).chain(tags.iter().flat_map(|tag| tokenize(tag))) {
            *counts.entry(token).or_insert(0) += 1;
        }
        Self::Sparse(counts)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Dense(values) => values.is_empty(),
            Self::Sparse(counts) => counts.is_empty(),
        }
    }

    /// Number of dimensions (dense) or distinct tokens (sparse).
    pub fn len(&self) -> usize {
        match self {
            Self::Dense(values) => values.len(),
            Self::Sparse(counts) => counts.len(),
        }
    }

    pub fn is_dense(&self) -> bool {
        matches!(self, Self::Dense(_))
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    cleaned
        .split_whitespace()
        .map(str::to_string)
        .collect::<Vec<_>>()
        .into_iter()
}

/// Similarity between two optional vectors, in `[-1, 1]`.
///
/// Returns 0 when either side is absent, empty, of a different representation,
/// or (dense only) of a different length.
pub fn similarity(a: Option<&EmbeddingVector>, b: Option<&EmbeddingVector>) -> f64 {
    match (a, b) {
        (Some(EmbeddingVector::Dense(x)), Some(EmbeddingVector::Dense(y))) => dense_cosine(x, y),
        (Some(EmbeddingVector::Sparse(x)), Some(EmbeddingVector::Sparse(y))) => {
            sparse_cosine(x, y)
        }
        _ => 0.0,
    }
}

fn dense_cosine(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    finish_cosine(dot, norm_a, norm_b)
}

fn sparse_cosine(a: &BTreeMap<String, u32>, b: &BTreeMap<String, u32>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    // Keys missing on one side contribute nothing to the dot product.
    let dot: f64 = a
        .iter()
        .filter_map(|(token, count)| b.get(token).map(|other| f64::from(*count) * f64::from(*other)))
        .sum();
    let norm_a: f64 = a.values().map(|c| f64::from(*c).powi(2)).sum();
    let norm_b: f64 = b.values().map(|c| f64::from(*c).powi(2)).sum();
    finish_cosine(dot, norm_a, norm_b)
}

fn finish_cosine(dot: f64, norm_a: f64, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}
