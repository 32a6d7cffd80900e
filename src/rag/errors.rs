// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for the retrieval pipeline
//!
//! Errors fall into two groups:
//! - Startup errors (configuration, ingestion, empty corpus, no chunks,
//!   index build) halt initialization; no query is ever served from a
//!   partial index
//! - Per-request errors (invalid query, query embedding, embedding
//!   mismatch, inference) are reported to the caller and leave the cached
//!   index untouched
//!
//! All variants are `Clone` so a memoized build failure can be handed to
//! every caller waiting on the same build.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::inference::InferenceError;

/// Failures while locating or reading the PDF corpus
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestionError {
    /// Configured directory is absent or not a directory
    #[error("Data directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    /// Directory exists but holds no `*.pdf` files
    #[error("No PDF files found in {}", path.display())]
    NoPdfFiles { path: PathBuf },

    /// A PDF could not be opened or its text could not be extracted
    #[error("Failed to read PDF {}: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },

    /// Directory listing failed
    #[error("Failed to list {}: {reason}", path.display())]
    Io { path: PathBuf, reason: String },
}

/// Errors produced by the retrieval-augmented answering pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RagError {
    /// Pipeline parameters are unusable, e.g. overlap not below chunk size
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Ingestion failed: {0}")]
    Ingestion(#[from] IngestionError),

    /// Every extracted page was empty or whitespace-only
    #[error("All {pages} extracted pages are empty; check that the PDFs contain extractable text")]
    EmptyCorpus { pages: usize },

    /// Chunking produced nothing from the non-empty pages
    #[error("No document chunks created from {pages} pages")]
    NoChunks { pages: usize },

    /// Embedding or storage failed while building the index
    #[error("Failed to build index: {0}")]
    IndexBuild(String),

    /// Query embedded with a different model than the index
    #[error("Embedding model mismatch: index uses {index_model}, query uses {query_model}")]
    EmbeddingMismatch {
        index_model: String,
        query_model: String,
    },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The embedding provider failed on a question, or returned a vector
    /// the index cannot search with
    #[error("Failed to embed query: {0}")]
    Embedding(String),

    #[error("Inference failed: {0}")]
    Inference(#[from] InferenceError),
}

impl RagError {
    /// Startup errors halt initialization; everything else is per-request
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RagError::Config(_)
                | RagError::Ingestion(_)
                | RagError::EmptyCorpus { .. }
                | RagError::NoChunks { .. }
                | RagError::IndexBuild(_)
        )
    }

    /// Get error code for logging and API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            RagError::Config(e) => e.error_code(),
            RagError::Ingestion(IngestionError::DirectoryNotFound { .. }) => "DATA_DIR_NOT_FOUND",
            RagError::Ingestion(IngestionError::NoPdfFiles { .. }) => "NO_PDF_FILES",
            RagError::Ingestion(IngestionError::Unreadable { .. }) => "PDF_UNREADABLE",
            RagError::Ingestion(IngestionError::Io { .. }) => "IO_ERROR",
            RagError::EmptyCorpus { .. } => "EMPTY_CORPUS",
            RagError::NoChunks { .. } => "NO_CHUNKS",
            RagError::IndexBuild(_) => "INDEX_BUILD_FAILED",
            RagError::EmbeddingMismatch { .. } => "EMBEDDING_MISMATCH",
            RagError::InvalidQuery(_) => "INVALID_QUERY",
            RagError::Embedding(_) => "EMBEDDING_FAILED",
            RagError::Inference(e) => e.error_code(),
        }
    }

    /// Get user-friendly error message for display
    pub fn user_message(&self) -> String {
        match self {
            RagError::Config(e) => e.user_message(),
            RagError::Ingestion(IngestionError::DirectoryNotFound { path }) => {
                format!("Document directory {} not found!", path.display())
            }
            RagError::Ingestion(IngestionError::NoPdfFiles { path }) => {
                format!("No PDF files found in {}!", path.display())
            }
            RagError::EmptyCorpus { .. } => {
                "All documents appear to be empty. Check if PDFs contain extractable text."
                    .to_string()
            }
            RagError::NoChunks { .. } => {
                "No document chunks created. Check if PDFs contain valid text.".to_string()
            }
            RagError::Inference(e) => format!("Error processing query: {}", e.user_message()),
            _ => self.to_string(),
        }
    }
}
