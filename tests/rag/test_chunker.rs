// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Chunking properties over whole pages

use fabstir_pdf_qa::ingest::Page;
use fabstir_pdf_qa::rag::{chunk_pages, chunk_text, ChunkingConfig, RagError};
use std::path::PathBuf;

fn page(text: String, number: u32) -> Page {
    Page {
        text,
        number,
        source: PathBuf::from("corpus/manual.pdf"),
    }
}

/// Pseudo-prose with varied characters so windows are distinguishable
fn prose(chars: usize) -> String {
    "The quick brown fox jumps over the lazy dog. Ünïcødé → ok! "
        .chars()
        .cycle()
        .take(chars)
        .collect()
}

#[test]
fn test_every_chunk_within_size() {
    let config = ChunkingConfig::default();
    for len in [1, 999, 1000, 1001, 2500, 7777] {
        let text = prose(len);
        for (_, window) in chunk_text(&text, &config) {
            let n = window.chars().count();
            assert!(n >= 1 && n <= config.chunk_size, "len {} produced {}", len, n);
        }
    }
}

#[test]
fn test_consecutive_chunks_share_overlap() {
    let config = ChunkingConfig::default();
    let text = prose(5321);
    let windows = chunk_text(&text, &config);
    assert!(windows.len() > 2);

    for pair in windows.windows(2) {
        let (first_start, first) = pair[0];
        let (second_start, second) = pair[1];
        assert_eq!(second_start - first_start, config.step());

        // The tail of each window after `step` chars opens the next one
        let tail: String = first.chars().skip(config.step()).collect();
        assert!(second.starts_with(&tail));
    }
}

#[test]
fn test_chunks_cover_whole_page() {
    let config = ChunkingConfig::default();
    let text = prose(4321);
    let windows = chunk_text(&text, &config);

    let mut rebuilt: String = windows[0].1.to_string();
    for (start, window) in windows.iter().skip(1) {
        let already = rebuilt.chars().count() - start;
        rebuilt.extend(window.chars().skip(already));
    }
    assert_eq!(rebuilt, text);
}

#[test]
fn test_chunking_is_idempotent() {
    let config = ChunkingConfig {
        chunk_size: 300,
        chunk_overlap: 50,
    };
    let pages = vec![page(prose(1234), 1), page(prose(77), 2)];

    let first = chunk_pages(&pages, &config).unwrap();
    let second = chunk_pages(&pages, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_short_page_is_single_chunk() {
    let pages = vec![page("Just one short page.".to_string(), 3)];
    let chunks = chunk_pages(&pages, &ChunkingConfig::default()).unwrap();

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "Just one short page.");
    assert_eq!(chunks[0].page, 3);
    assert_eq!(chunks[0].ordinal, 0);
}

#[test]
fn test_worked_example_counts() {
    // 2500 chars -> starts at 0, 800, 1600, 2400; 400 chars -> one chunk
    let pages = vec![page("x".repeat(2500), 1), page("y".repeat(400), 3)];
    let chunks = chunk_pages(&pages, &ChunkingConfig::default()).unwrap();

    assert_eq!(chunks.len(), 5);
    let starts: Vec<usize> = chunks.iter().map(|c| c.start_char).collect();
    assert_eq!(starts, vec![0, 800, 1600, 2400, 0]);
    assert_eq!(chunks[3].char_len(), 100);
    assert_eq!(chunks[4].page, 3);
}

#[test]
fn test_multibyte_text_not_split_inside_code_point() {
    let config = ChunkingConfig {
        chunk_size: 7,
        chunk_overlap: 2,
    };
    let text = "日本語のテキストを分割する";
    let windows = chunk_text(text, &config);

    assert_eq!(windows[0].1, "日本語のテキス");
    for (_, window) in &windows {
        assert!(window.chars().count() <= 7);
    }
}

#[test]
fn test_no_pages_means_no_chunks() {
    let result = chunk_pages(&[], &ChunkingConfig::default());
    assert_eq!(result, Err(RagError::NoChunks { pages: 0 }));
}

#[test]
fn test_zero_overlap_allowed() {
    let config = ChunkingConfig {
        chunk_size: 10,
        chunk_overlap: 0,
    };
    let windows = chunk_text("abcdefghijklmnopqrstuvwxy", &config);
    let texts: Vec<&str> = windows.iter().map(|(_, w)| *w).collect();
    assert_eq!(texts, vec!["abcdefghij", "klmnopqrst", "uvwxy"]);
}
