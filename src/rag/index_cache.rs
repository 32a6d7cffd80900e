// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Build-once cache for vector indexes
//!
//! Indexes are keyed by the configuration that produced them (data
//! directory and embedding model). Each key owns a `OnceCell`: the first
//! caller runs the build, concurrent callers wait on the same cell, and
//! everyone gets the same `Arc<VectorIndex>`. A failed build is stored as
//! well, so waiters see that one failure and nothing rebuilds until the key
//! is invalidated.
//!
//! ```rust,ignore
//! let cache = IndexCache::new();
//! let index = cache
//!     .get_or_build(key, || async { builder.build(&dir).await.map(|(i, _)| i) })
//!     .await?;
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};

use super::errors::RagError;
use super::vector_index::VectorIndex;

type BuildResult = Result<Arc<VectorIndex>, RagError>;

/// Configuration an index depends on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexKey {
    pub data_dir: PathBuf,
    pub embedding_model: String,
}

impl IndexKey {
    pub fn new(data_dir: impl Into<PathBuf>, embedding_model: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            embedding_model: embedding_model.into(),
        }
    }
}

/// Cache metrics for monitoring
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheMetrics {
    /// Requests answered by an already-initialized cell
    pub hits: usize,
    /// Requests that found the cell uninitialized
    pub misses: usize,
    /// Builds actually executed
    pub builds: usize,
}

impl CacheMetrics {
    /// Calculate hit rate (hits / total requests)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
pub struct IndexCache {
    cells: Mutex<HashMap<IndexKey, Arc<OnceCell<BuildResult>>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
    builds: AtomicUsize,
}

impl std::fmt::Debug for IndexCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexCache")
            .field("metrics", &self.metrics())
            .finish_non_exhaustive()
    }
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the index for `key`, building it with `build` at most once
    pub async fn get_or_build<F, Fut>(&self, key: IndexKey, build: F) -> BuildResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<VectorIndex, RagError>>,
    {
        let cell = {
            let mut cells = self.cells.lock().await;
            cells.entry(key.clone()).or_default().clone()
        };

        if let Some(result) = cell.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return result.clone();
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let result = cell
            .get_or_init(|| async move {
                self.builds.fetch_add(1, Ordering::Relaxed);
                info!(
                    "Building vector index for {} ({})",
                    key.data_dir.display(),
                    key.embedding_model
                );
                build().await.map(Arc::new)
            })
            .await;
        result.clone()
    }

    /// Already-built index for `key`, without triggering a build
    pub async fn get(&self, key: &IndexKey) -> Option<BuildResult> {
        let cells = self.cells.lock().await;
        cells.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Drop the cached index (or cached failure) for `key`
    ///
    /// Callers already holding the old `Arc` keep using it; the next
    /// `get_or_build` starts a fresh build.
    pub async fn invalidate(&self, key: &IndexKey) -> bool {
        let removed = self.cells.lock().await.remove(key).is_some();
        if removed {
            debug!("Invalidated index for {}", key.data_dir.display());
        }
        removed
    }

    /// Drop every cached index
    pub async fn clear(&self) {
        self.cells.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.cells.lock().await.len()
    }

    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
        }
    }
}
