// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Query-time retrieval against a built index

use super::common::{corpus, CountingEmbedder};
use fabstir_pdf_qa::embeddings::HashEmbedder;
use fabstir_pdf_qa::rag::{ChunkingConfig, IndexBuilder, RagError, Retriever, VectorIndex};
use std::sync::Arc;
use std::time::Duration;

fn sentences() -> Vec<String> {
    [
        "Photosynthesis converts light energy into chemical energy.",
        "The mitochondria is the powerhouse of the cell.",
        "Rust guarantees memory safety without a garbage collector.",
        "Tokio is an asynchronous runtime for Rust.",
        "Cosine similarity measures the angle between two vectors.",
        "The Treaty of Westphalia was signed in 1648.",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

async fn build(embedder: Arc<CountingEmbedder>) -> (tempfile::TempDir, VectorIndex) {
    // One sentence per page keeps each chunk equal to its page text
    let (dir, ingestor) = corpus(&[("facts.pdf", sentences())]);
    let (index, _) = IndexBuilder::new(ingestor, embedder, ChunkingConfig::default(), 4)
        .build(dir.path())
        .await
        .unwrap();
    (dir, index)
}

#[tokio::test]
async fn test_chunk_text_retrieves_itself_first() {
    let embedder = Arc::new(CountingEmbedder::new(Duration::ZERO));
    let (_dir, index) = build(embedder.clone()).await;
    let retriever = Retriever::new(embedder, 4);

    for (i, sentence) in sentences().iter().enumerate() {
        let results = retriever.retrieve(&index, sentence).await.unwrap();
        assert_eq!(&results[0].text, sentence);
        assert_eq!(results[0].page, i as u32 + 1);
        assert!(results[0].score > 0.999);
    }
}

#[tokio::test]
async fn test_top_four_ordered_by_score() {
    let embedder = Arc::new(CountingEmbedder::new(Duration::ZERO));
    let (_dir, index) = build(embedder.clone()).await;
    let retriever = Retriever::new(embedder, 4);

    let results = retriever
        .retrieve(&index, "How does Rust manage memory?")
        .await
        .unwrap();

    assert_eq!(results.len(), 4);
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    for result in &results {
        assert!(result.source.ends_with("facts.pdf"));
    }
}

#[tokio::test]
async fn test_k_larger_than_index_returns_everything() {
    let embedder = Arc::new(CountingEmbedder::new(Duration::ZERO));
    let (_dir, index) = build(embedder.clone()).await;
    let retriever = Retriever::new(embedder, 4);

    let results = retriever.retrieve_k(&index, "anything", 50).await.unwrap();
    assert_eq!(results.len(), sentences().len());
}

#[tokio::test]
async fn test_retrieval_does_not_change_index() {
    let embedder = Arc::new(CountingEmbedder::new(Duration::ZERO));
    let (_dir, index) = build(embedder.clone()).await;
    let retriever = Retriever::new(embedder, 2);

    let before: Vec<_> = index.entries().iter().map(|e| e.chunk.clone()).collect();
    let first = retriever.retrieve(&index, "vectors").await.unwrap();
    let second = retriever.retrieve(&index, "vectors").await.unwrap();
    let after: Vec<_> = index.entries().iter().map(|e| e.chunk.clone()).collect();

    assert_eq!(first, second);
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_other_embedding_model_rejected() {
    let embedder = Arc::new(CountingEmbedder::new(Duration::ZERO));
    let (_dir, index) = build(embedder).await;
    let retriever = Retriever::new(Arc::new(HashEmbedder::new("other-model", 32).unwrap()), 4);

    let result = retriever.retrieve(&index, "cells").await;
    assert!(matches!(
        result,
        Err(RagError::EmbeddingMismatch { ref index_model, .. }) if index_model == "counting-hash"
    ));
}
