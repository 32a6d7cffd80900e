// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// RAG (Retrieval-Augmented Generation) module
// Chunking, embedding index construction and query-time retrieval over a PDF corpus

pub mod builder;
pub mod chunker;
pub mod errors;
pub mod index_cache;
pub mod retriever;
pub mod vector_index;

pub use builder::{BuildStats, IndexBuilder};
pub use chunker::{chunk_pages, chunk_text, Chunk, ChunkingConfig};
pub use errors::{IngestionError, RagError};
pub use index_cache::{CacheMetrics, IndexCache, IndexKey};
pub use retriever::{validate_query, RetrievedChunk, Retriever, MAX_QUERY_CHARS};
pub use vector_index::{cosine_similarity, IndexEntry, SearchHit, VectorIndex};
