// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Query-time retrieval

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use super::errors::RagError;
use super::vector_index::VectorIndex;
use crate::embeddings::EmbeddingProvider;

/// Longest accepted question, in characters
pub const MAX_QUERY_CHARS: usize = 4000;

/// One retrieved chunk with its similarity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedChunk {
    pub text: String,
    pub score: f32,
    pub source: PathBuf,
    pub page: u32,
}

/// Embeds questions and looks them up in an index
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    default_k: usize,
}

impl Retriever {
    /// `embedder` must be the provider the index was built with
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, default_k: usize) -> Self {
        Self {
            embedder,
            default_k: default_k.max(1),
        }
    }

    pub fn default_k(&self) -> usize {
        self.default_k
    }

    pub async fn retrieve(
        &self,
        index: &VectorIndex,
        query: &str,
    ) -> Result<Vec<RetrievedChunk>, RagError> {
        self.retrieve_k(index, query, self.default_k).await
    }

    /// Up to `k` chunks, highest similarity first
    pub async fn retrieve_k(
        &self,
        index: &VectorIndex,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedChunk>, RagError> {
        validate_query(query)?;
        if k == 0 {
            return Err(RagError::InvalidQuery("k must be greater than 0".to_string()));
        }

        if index.model_name() != self.embedder.model_name() {
            return Err(RagError::EmbeddingMismatch {
                index_model: index.model_name().to_string(),
                query_model: self.embedder.model_name().to_string(),
            });
        }

        // Provider and lookup failures are server-side, not the caller's fault
        let vector = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| RagError::Embedding(e.to_string()))?;

        let hits = index
            .search(&vector, k)
            .map_err(|e| RagError::Embedding(e.to_string()))?;

        debug!(
            "Retrieved {} chunks (top score {:?})",
            hits.len(),
            hits.first().map(|h| h.score)
        );

        Ok(hits
            .into_iter()
            .map(|hit| RetrievedChunk {
                text: hit.chunk.text,
                score: hit.score,
                source: hit.chunk.source,
                page: hit.chunk.page,
            })
            .collect())
    }
}

/// Reject empty or oversized questions
pub fn validate_query(query: &str) -> Result<(), RagError> {
    if query.trim().is_empty() {
        return Err(RagError::InvalidQuery("Query cannot be empty".to_string()));
    }
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(RagError::InvalidQuery(format!(
            "Query too long (max {} characters)",
            MAX_QUERY_CHARS
        )));
    }
    Ok(())
}
