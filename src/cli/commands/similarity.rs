//! `teamspace similarity <a> <b>`: score two texts the way voters are ranked.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::context::build_embedding_provider;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::EmbeddingVector;
use crate::infrastructure::config::ConfigLoader;
use crate::services::SimilarityEngine;

#[derive(Args, Debug)]
pub struct SimilarityArgs {
    pub a: String,
    pub b: String,

    /// Tags for the first text (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub tags_a: Vec<String>,

    /// Tags for the second text (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub tags_b: Vec<String>,

    /// Ignore the configured provider and use local token vectors
    #[arg(long)]
    pub local: bool,
}

#[derive(Debug, Serialize)]
pub struct SimilarityOutput {
    pub score: f64,
    /// Representation the score was computed on: dense or sparse
    pub representation: &'static str,
    pub provider: &'static str,
}

impl CommandOutput for SimilarityOutput {
    fn to_human(&self) -> String {
        format!("{:.4} ({}, {})", self.score, self.representation, self.provider)
    }
}

pub async fn execute(args: SimilarityArgs, json_mode: bool) -> Result<()> {
    let engine = if args.local {
        SimilarityEngine::local()
    } else {
        let config = ConfigLoader::load()?;
        SimilarityEngine::new(build_embedding_provider(&config.embedding))
    };

    let (a, b) = futures::join!(
        engine.embed(&args.a, &args.tags_a),
        engine.embed(&args.b, &args.tags_b)
    );
    // A one-sided provider failure would score 0; compare locally instead
    let (a, b) = if a.is_dense() == b.is_dense() {
        (a, b)
    } else {
        (
            EmbeddingVector::from_tokens(&args.a, &args.tags_a),
            EmbeddingVector::from_tokens(&args.b, &args.tags_b),
        )
    };

    output(
        &SimilarityOutput {
            score: SimilarityEngine::similarity(Some(&a), Some(&b)),
            representation: if a.is_dense() { "dense" } else { "sparse" },
            provider: engine.provider_name(),
        },
        json_mode,
    );
    Ok(())
}
