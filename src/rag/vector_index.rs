// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-memory vector index over document chunks
//!
//! Exact cosine-similarity search. Entries are fixed at construction and
//! every query method takes `&self`, so one `Arc<VectorIndex>` can be shared
//! by all request handlers.

use anyhow::{anyhow, Result};
use std::cmp::Ordering;

use super::chunker::Chunk;

/// Stored (vector, chunk) pair
#[derive(Clone, Debug)]
pub struct IndexEntry {
    pub vector: Vec<f32>,
    pub chunk: Chunk,
}

/// Result from vector search
#[derive(Clone, Debug, PartialEq)]
pub struct SearchHit {
    /// Position of the entry in the index
    pub position: usize,
    pub score: f32,
    pub chunk: Chunk,
}

/// Immutable cosine-similarity index
#[derive(Debug)]
pub struct VectorIndex {
    model_name: String,
    dimension: usize,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Build an index from fully-embedded entries
    ///
    /// Every vector must have `dimension` finite components; otherwise
    /// nothing is built.
    pub fn from_entries(
        model_name: impl Into<String>,
        dimension: usize,
        entries: Vec<IndexEntry>,
    ) -> Result<Self> {
        if dimension == 0 {
            return Err(anyhow!("Index dimension must be greater than 0"));
        }

        for (i, entry) in entries.iter().enumerate() {
            if entry.vector.len() != dimension {
                return Err(anyhow!(
                    "Invalid vector dimensions at entry {}: expected {}, got {}",
                    i,
                    dimension,
                    entry.vector.len()
                ));
            }
            if entry.vector.iter().any(|v| !v.is_finite()) {
                return Err(anyhow!(
                    "Invalid vector values at entry {}: contains NaN or Infinity",
                    i
                ));
            }
        }

        Ok(Self {
            model_name: model_name.into(),
            dimension,
            entries,
        })
    }

    /// Embedding model the stored vectors came from
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Top-`k` entries by cosine similarity, best first
    ///
    /// Ties keep index order. An empty index returns an empty vec.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if k == 0 {
            return Err(anyhow!("k must be greater than 0"));
        }
        if query.len() != self.dimension {
            return Err(anyhow!(
                "Invalid query dimensions: expected {}, got {}",
                self.dimension,
                query.len()
            ));
        }
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query, &entry.vector)))
            .collect();

        // Stable sort, so equal scores stay in insertion order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| SearchHit {
                position,
                score,
                chunk: self.entries[position].chunk.clone(),
            })
            .collect())
    }
}

/// Cosine similarity of two equal-length vectors; 0.0 if either is zero
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
