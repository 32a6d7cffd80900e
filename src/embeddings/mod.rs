// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text embedding providers
//!
//! The index and the retriever must embed with the same provider; the
//! model name travels with the index so a mismatch is caught at query time.

pub mod hashed;
pub mod onnx_model;

use anyhow::Result;
use async_trait::async_trait;

pub use hashed::HashEmbedder;
pub use onnx_model::OnnxEmbeddingModel;

/// Maps text to fixed-dimension vectors
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier, recorded in the index at build time
    fn model_name(&self) -> &str;

    /// Length of every vector this provider returns
    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts; output order matches input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}

/// Scale `vector` to unit length in place; zero vectors are left alone
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}
