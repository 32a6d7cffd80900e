// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Deterministic hash-based embedder
//!
//! Produces pseudo-random unit vectors seeded from the text hash. Identical
//! text always gets the identical vector, which is enough for pipeline tests
//! and for running the node without model files (`--hash-embeddings`).
//! Scores carry no semantic meaning.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::{l2_normalize, EmbeddingProvider};

#[derive(Debug, Clone)]
pub struct HashEmbedder {
    model_name: String,
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(model_name: impl Into<String>, dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(anyhow!("Embedding dimension must be greater than 0"));
        }
        Ok(Self {
            model_name: model_name.into(),
            dimension,
        })
    }

    fn generate(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut seed = hasher.finish();

        let mut embedding = Vec::with_capacity(self.dimension);
        for i in 0..self.dimension {
            // LCG step, mixed with the position
            seed = (seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407))
                ^ (i as u64);
            let value = (seed >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0;
            embedding.push(value as f32);
        }

        l2_normalize(&mut embedding);
        embedding
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.generate(text))
    }
}
