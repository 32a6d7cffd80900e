// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Index construction: ingest → filter → chunk → embed → index

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::chunker::{chunk_pages, ChunkingConfig};
use super::errors::RagError;
use super::vector_index::{IndexEntry, VectorIndex};
use crate::config::ConfigError;
use crate::embeddings::EmbeddingProvider;
use crate::ingest::{non_empty_pages, DocumentIngestor};

/// Summary of a completed build, for logs and the `index` command
#[derive(Debug, Clone, PartialEq)]
pub struct BuildStats {
    pub documents: usize,
    pub pages: usize,
    pub non_empty_pages: usize,
    pub chunks: usize,
    pub elapsed_ms: u64,
}

/// Builds a `VectorIndex` from a directory of PDFs
#[derive(Clone)]
pub struct IndexBuilder {
    ingestor: DocumentIngestor,
    embedder: Arc<dyn EmbeddingProvider>,
    chunking: ChunkingConfig,
    batch_size: usize,
}

impl IndexBuilder {
    pub fn new(
        ingestor: DocumentIngestor,
        embedder: Arc<dyn EmbeddingProvider>,
        chunking: ChunkingConfig,
        batch_size: usize,
    ) -> Self {
        Self {
            ingestor,
            embedder,
            chunking,
            batch_size: batch_size.max(1),
        }
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Run the full pipeline
    ///
    /// Bad chunking parameters are rejected before any PDF is opened.
    /// Ingestion problems surface before the embedder is called. Any
    /// embedding failure discards everything built so far.
    pub async fn build(&self, data_dir: &Path) -> Result<(VectorIndex, BuildStats), RagError> {
        let start = Instant::now();
        self.chunking.validate().map_err(ConfigError::Invalid)?;

        let ingestor = self.ingestor.clone();
        let dir: PathBuf = data_dir.to_path_buf();
        let documents = tokio::task::spawn_blocking(move || ingestor.load(&dir))
            .await
            .map_err(|e| RagError::IndexBuild(format!("Document loading task failed: {}", e)))??;

        let page_count: usize = documents.iter().map(|d| d.page_count()).sum();
        let pages = non_empty_pages(&documents)?;
        let chunks = chunk_pages(&pages, &self.chunking)?;

        let model = self.embedder.model_name().to_string();
        let dimension = self.embedder.dimension();
        info!(
            "Embedding {} chunks with {} ({} dimensions)",
            chunks.len(),
            model,
            dimension
        );

        let mut entries = Vec::with_capacity(chunks.len());
        let total_batches = chunks.len().div_ceil(self.batch_size);
        for (batch_no, batch) in chunks.chunks(self.batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await.map_err(|e| {
                RagError::IndexBuild(format!(
                    "Embedding failed for batch {}/{}: {}",
                    batch_no + 1,
                    total_batches,
                    e
                ))
            })?;

            if vectors.len() != batch.len() {
                return Err(RagError::IndexBuild(format!(
                    "Embedder returned {} vectors for {} chunks",
                    vectors.len(),
                    batch.len()
                )));
            }

            entries.extend(
                vectors
                    .into_iter()
                    .zip(batch.iter().cloned())
                    .map(|(vector, chunk)| IndexEntry { vector, chunk }),
            );
            debug!("Embedded batch {}/{}", batch_no + 1, total_batches);
        }

        let index = VectorIndex::from_entries(model, dimension, entries)
            .map_err(|e| RagError::IndexBuild(e.to_string()))?;

        let stats = BuildStats {
            documents: documents.len(),
            pages: page_count,
            non_empty_pages: pages.len(),
            chunks: index.len(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            "Vector store created: {} chunks from {} documents in {}ms",
            stats.chunks, stats.documents, stats.elapsed_ms
        );

        Ok((index, stats))
    }
}
