// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Question-answering service
//!
//! `QaService` owns every long-lived piece of the pipeline. The binary
//! builds exactly one and shares it as `Arc<QaService>` with the CLI
//! commands and the HTTP handlers.

use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::embeddings::EmbeddingProvider;
use crate::inference::{Answer, AnswerComposer, ChatCompletionClient, GroqClient};
use crate::ingest::{discover_pdf_files, DocumentIngestor};
use crate::rag::{
    validate_query, BuildStats, CacheMetrics, IndexBuilder, IndexCache, IndexKey, RagError,
    Retriever, VectorIndex,
};

pub struct QaService {
    config: AppConfig,
    builder: IndexBuilder,
    retriever: Retriever,
    composer: AnswerComposer,
    cache: IndexCache,
    last_build: Mutex<Option<BuildStats>>,
}

impl std::fmt::Debug for QaService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QaService")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl QaService {
    pub fn new(
        config: AppConfig,
        ingestor: DocumentIngestor,
        embedder: Arc<dyn EmbeddingProvider>,
        client: Arc<dyn ChatCompletionClient>,
    ) -> Self {
        let builder = IndexBuilder::new(
            ingestor,
            embedder.clone(),
            config.chunking,
            config.embedding.batch_size,
        );
        let retriever = Retriever::new(embedder, config.top_k);
        let composer = AnswerComposer::new(client, config.llm.model.clone());

        Self {
            config,
            builder,
            retriever,
            composer,
            cache: IndexCache::new(),
            last_build: Mutex::new(None),
        }
    }

    /// Service backed by lopdf and the configured remote inference endpoint
    pub fn from_config(
        config: AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, RagError> {
        let client = GroqClient::from_settings(&config.llm)?;
        Ok(Self::new(
            config,
            DocumentIngestor::default(),
            embedder,
            Arc::new(client),
        ))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn index_key(&self) -> IndexKey {
        IndexKey::new(
            self.config.data_dir.clone(),
            self.builder.embedder().model_name(),
        )
    }

    /// The vector index, built on first use
    ///
    /// Concurrent first callers share one build. A failed build stays
    /// failed until `invalidate_index` is called.
    pub async fn index(&self) -> Result<Arc<VectorIndex>, RagError> {
        let dir = self.config.data_dir.clone();
        self.cache
            .get_or_build(self.index_key(), || async move {
                let (index, stats) = self.builder.build(&dir).await?;
                if let Ok(mut last) = self.last_build.lock() {
                    *last = Some(stats);
                }
                Ok(index)
            })
            .await
    }

    /// Build the index now so startup problems surface before serving
    pub async fn warm_up(&self) -> Result<Arc<VectorIndex>, RagError> {
        let count = self.pdf_count()?;
        info!("There are {} PDF files available to refer", count);
        self.index().await
    }

    pub async fn ask(&self, query: &str) -> Result<Answer, RagError> {
        self.ask_with_k(query, self.retriever.default_k()).await
    }

    /// Retrieve `k` chunks and generate an answer from them
    ///
    /// Inference failures are returned to the caller and never touch the
    /// cached index.
    pub async fn ask_with_k(&self, query: &str, k: usize) -> Result<Answer, RagError> {
        validate_query(query)?;
        let index = self.index().await?;
        let context = self.retriever.retrieve_k(&index, query, k).await?;

        match self.composer.compose(query, context).await {
            Ok(answer) => Ok(answer),
            Err(e) => {
                warn!("Query failed: {}", e);
                Err(e)
            }
        }
    }

    /// Drop the cached index; the next request rebuilds from disk
    ///
    /// Build stats are cleared with it, so a failed rebuild never reports
    /// the previous index as ready.
    pub async fn invalidate_index(&self) -> bool {
        if let Ok(mut last) = self.last_build.lock() {
            *last = None;
        }
        self.cache.invalidate(&self.index_key()).await
    }

    /// True only while a successfully built index is cached
    pub async fn index_ready(&self) -> bool {
        matches!(self.cache.get(&self.index_key()).await, Some(Ok(_)))
    }

    /// Number of PDFs currently in the data directory
    pub fn pdf_count(&self) -> Result<usize, RagError> {
        Ok(discover_pdf_files(&self.config.data_dir)?.len())
    }

    /// Counts from the most recent successful build
    pub fn last_build_stats(&self) -> Option<BuildStats> {
        self.last_build.lock().ok().and_then(|s| s.clone())
    }

    pub fn cache_metrics(&self) -> CacheMetrics {
        self.cache.metrics()
    }
}
