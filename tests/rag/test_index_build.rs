// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Index construction and the build-once cache

use super::common::{corpus, missing_dir, CountingEmbedder, Fault, FaultyEmbedder};
use async_trait::async_trait;
use fabstir_pdf_qa::config::AppConfig;
use fabstir_pdf_qa::inference::{ChatCompletionClient, InferenceError};
use fabstir_pdf_qa::ingest::DocumentIngestor;
use fabstir_pdf_qa::rag::{
    ChunkingConfig, IndexBuilder, IndexCache, IndexKey, IngestionError, RagError,
};
use fabstir_pdf_qa::service::QaService;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;

fn builder(ingestor: DocumentIngestor, embedder: Arc<CountingEmbedder>) -> IndexBuilder {
    IndexBuilder::new(ingestor, embedder, ChunkingConfig::default(), 32)
}

#[tokio::test]
async fn test_three_page_document_yields_five_chunks() {
    let (dir, ingestor) = corpus(&[(
        "report.pdf",
        vec!["a".repeat(2500), "   \n\t".to_string(), "b".repeat(400)],
    )]);
    let embedder = Arc::new(CountingEmbedder::new(Duration::ZERO));

    let (index, stats) = builder(ingestor, embedder.clone())
        .build(dir.path())
        .await
        .unwrap();

    assert_eq!(index.len(), 5);
    assert_eq!(stats.pages, 3);
    assert_eq!(stats.non_empty_pages, 2);
    assert_eq!(embedder.texts_embedded(), 5);

    let pages: Vec<u32> = index.entries().iter().map(|e| e.chunk.page).collect();
    assert_eq!(pages, vec![1, 1, 1, 1, 3]);
}

#[tokio::test]
async fn test_documents_indexed_in_path_order() {
    let (dir, ingestor) = corpus(&[
        ("b.pdf", vec!["second file".to_string()]),
        ("a.pdf", vec!["first file".to_string()]),
    ]);
    let embedder = Arc::new(CountingEmbedder::new(Duration::ZERO));

    let (index, stats) = builder(ingestor, embedder).build(dir.path()).await.unwrap();

    assert_eq!(stats.documents, 2);
    let texts: Vec<&str> = index.entries().iter().map(|e| e.chunk.text.as_str()).collect();
    assert_eq!(texts, vec!["first file", "second file"]);
}

#[tokio::test]
async fn test_missing_corpus_fails_before_embedding() {
    let embedder = Arc::new(CountingEmbedder::new(Duration::ZERO));
    let result = builder(DocumentIngestor::default(), embedder.clone())
        .build(&missing_dir())
        .await;

    assert!(matches!(
        result,
        Err(RagError::Ingestion(IngestionError::DirectoryNotFound { .. }))
    ));
    assert_eq!(embedder.calls(), 0);
}

#[tokio::test]
async fn test_directory_without_pdfs_fails_before_embedding() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not a pdf").unwrap();
    let embedder = Arc::new(CountingEmbedder::new(Duration::ZERO));

    let result = builder(DocumentIngestor::default(), embedder.clone())
        .build(dir.path())
        .await;

    assert!(matches!(
        result,
        Err(RagError::Ingestion(IngestionError::NoPdfFiles { .. }))
    ));
    assert_eq!(embedder.calls(), 0);
}

#[tokio::test]
async fn test_all_blank_pages_is_empty_corpus() {
    let (dir, ingestor) = corpus(&[("scan.pdf", vec![String::new(), "  ".to_string()])]);
    let embedder = Arc::new(CountingEmbedder::new(Duration::ZERO));

    let result = builder(ingestor, embedder.clone()).build(dir.path()).await;

    assert_eq!(result.unwrap_err(), RagError::EmptyCorpus { pages: 2 });
    assert_eq!(embedder.calls(), 0);
}

#[tokio::test]
async fn test_concurrent_first_requests_share_one_build() {
    let (dir, ingestor) = corpus(&[("guide.pdf", vec!["c".repeat(3000)])]);
    let embedder = Arc::new(CountingEmbedder::new(Duration::from_millis(50)));
    let builder = builder(ingestor, embedder.clone());
    let cache = Arc::new(IndexCache::new());
    let key = IndexKey::new(dir.path(), "counting-hash");

    let requests = (0..8).map(|_| {
        let cache = cache.clone();
        let builder = builder.clone();
        let key = key.clone();
        let path = dir.path().to_path_buf();
        async move {
            cache
                .get_or_build(key, || async move {
                    builder.build(&path).await.map(|(index, _)| index)
                })
                .await
        }
    });
    let results = join_all(requests).await;

    let first = results[0].as_ref().unwrap();
    for result in &results {
        assert!(Arc::ptr_eq(first, result.as_ref().unwrap()));
    }
    assert_eq!(cache.metrics().builds, 1);
    // 3000 chars -> 4 chunks, one batch
    assert_eq!(embedder.calls(), 1);
    assert_eq!(embedder.texts_embedded(), 4);
}

#[tokio::test]
async fn test_failed_build_shared_by_concurrent_callers() {
    let embedder = Arc::new(CountingEmbedder::new(Duration::ZERO));
    let builder = builder(DocumentIngestor::default(), embedder);
    let cache = IndexCache::new();
    let key = IndexKey::new(missing_dir(), "counting-hash");

    let results = join_all((0..4).map(|_| {
        let builder = builder.clone();
        let key = key.clone();
        let cache = &cache;
        async move {
            cache
                .get_or_build(key, || async move {
                    builder.build(&missing_dir()).await.map(|(index, _)| index)
                })
                .await
        }
    }))
    .await;

    for result in results {
        assert!(result.unwrap_err().is_fatal());
    }
    assert_eq!(cache.metrics().builds, 1);
}

/// Five one-chunk pages, so a batch size of 2 gives three batches
fn five_pages() -> Vec<String> {
    (1..=5).map(|i| format!("page {} text", i)).collect()
}

#[tokio::test]
async fn test_embedding_failure_mid_build_is_index_build_error() {
    let (dir, ingestor) = corpus(&[("notes.pdf", five_pages())]);
    let embedder = Arc::new(FaultyEmbedder::new(Fault::FailOnBatch(2)));
    let builder = IndexBuilder::new(ingestor, embedder.clone(), ChunkingConfig::default(), 2);

    let err = builder.build(dir.path()).await.unwrap_err();
    match err {
        RagError::IndexBuild(msg) => {
            assert!(msg.contains("batch 2/3"), "{}", msg);
            assert!(msg.contains("embedding provider unavailable"), "{}", msg);
        }
        other => panic!("expected IndexBuild, got {:?}", other),
    }
    // The third batch is never requested
    assert_eq!(embedder.calls(), 2);
}

#[tokio::test]
async fn test_short_embedding_batch_is_index_build_error() {
    let (dir, ingestor) = corpus(&[("notes.pdf", five_pages())]);
    let embedder = Arc::new(FaultyEmbedder::new(Fault::ShortBatch));
    let builder = IndexBuilder::new(ingestor, embedder.clone(), ChunkingConfig::default(), 2);

    let err = builder.build(dir.path()).await.unwrap_err();
    assert_eq!(
        err,
        RagError::IndexBuild("Embedder returned 1 vectors for 2 chunks".to_string())
    );
    assert_eq!(embedder.calls(), 1);
}

struct UnusedClient;

#[async_trait]
impl ChatCompletionClient for UnusedClient {
    async fn complete(&self, _model: &str, _prompt: &str) -> Result<String, InferenceError> {
        panic!("no answer may be generated without an index");
    }
}

#[tokio::test]
async fn test_service_serves_no_partial_index() {
    let (dir, ingestor) = corpus(&[("notes.pdf", five_pages())]);
    let mut config = AppConfig::with_credentials("groq", "openai");
    config.data_dir = dir.path().to_path_buf();
    config.embedding.batch_size = 2;
    let service = QaService::new(
        config,
        ingestor,
        Arc::new(FaultyEmbedder::new(Fault::FailOnBatch(2))),
        Arc::new(UnusedClient),
    );

    let first = service.index().await.unwrap_err();
    assert!(matches!(first, RagError::IndexBuild(_)));
    assert!(first.is_fatal());

    let err = service.ask("What is on page 5?").await.unwrap_err();
    assert_eq!(err, first);
    assert!(!service.index_ready().await);
    assert!(service.last_build_stats().is_none());
    assert_eq!(service.cache_metrics().builds, 1);
}
