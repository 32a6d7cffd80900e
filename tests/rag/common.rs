// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Shared fixtures for RAG integration tests

use anyhow::Result;
use async_trait::async_trait;
use fabstir_pdf_qa::embeddings::{EmbeddingProvider, HashEmbedder};
use fabstir_pdf_qa::ingest::{DocumentIngestor, PdfTextExtractor};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Serves page texts per file name instead of parsing real PDFs
pub struct MapExtractor(pub HashMap<String, Vec<String>>);

impl PdfTextExtractor for MapExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, String> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        self.0
            .get(name)
            .cloned()
            .ok_or_else(|| format!("no fixture for {}", name))
    }
}

/// Hash embedder that counts calls and can be slowed down
pub struct CountingEmbedder {
    inner: HashEmbedder,
    pub texts_embedded: AtomicUsize,
    pub calls: AtomicUsize,
    delay: Duration,
}

impl CountingEmbedder {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: HashEmbedder::new("counting-hash", 32).unwrap(),
            texts_embedded: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            delay,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn texts_embedded(&self) -> usize {
        self.texts_embedded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for CountingEmbedder {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts_embedded.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts_embedded.fetch_add(texts.len(), Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.embed_batch(texts).await
    }
}

/// How `FaultyEmbedder` misbehaves
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// Return an error for this 1-based batch number
    FailOnBatch(usize),
    /// Drop the last vector of every batch
    ShortBatch,
}

/// Counting embedder that breaks in a configured way during `embed_batch`
pub struct FaultyEmbedder {
    inner: CountingEmbedder,
    fault: Fault,
}

impl FaultyEmbedder {
    pub fn new(fault: Fault) -> Self {
        Self {
            inner: CountingEmbedder::new(Duration::ZERO),
            fault,
        }
    }

    pub fn calls(&self) -> usize {
        self.inner.calls()
    }
}

#[async_trait]
impl EmbeddingProvider for FaultyEmbedder {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = self.inner.embed_batch(texts).await?;
        match self.fault {
            Fault::FailOnBatch(n) if self.inner.calls() == n => {
                anyhow::bail!("embedding provider unavailable")
            }
            Fault::FailOnBatch(_) => {}
            Fault::ShortBatch => {
                vectors.pop();
            }
        }
        Ok(vectors)
    }
}

/// Temp data dir holding empty `*.pdf` files named after the fixture keys
pub fn corpus(files: &[(&str, Vec<String>)]) -> (tempfile::TempDir, DocumentIngestor) {
    let dir = tempfile::tempdir().unwrap();
    let mut map = HashMap::new();
    for (name, pages) in files {
        std::fs::write(dir.path().join(name), b"").unwrap();
        map.insert(name.to_string(), pages.clone());
    }
    (dir, DocumentIngestor::new(Arc::new(MapExtractor(map))))
}

pub fn missing_dir() -> PathBuf {
    PathBuf::from("/nonexistent/pdf-qa-test-data")
}
