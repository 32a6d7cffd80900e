// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fixed-size overlapping text chunker
//!
//! Windows are measured in characters, not bytes, so multi-byte text is
//! never split inside a code point. Each window starts
//! `chunk_size - chunk_overlap` characters after the previous one and the
//! walk continues while the start offset is still inside the text, so the
//! final window may be shorter than `chunk_size`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

use super::errors::RagError;
use crate::config::ConfigError;
use crate::ingest::Page;

/// Chunking parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks of the same page
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than 0".to_string());
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            ));
        }
        Ok(())
    }

    /// Distance in characters between consecutive chunk starts
    pub fn step(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }
}

/// A bounded segment of one page's text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub text: String,
    pub source: PathBuf,
    pub page: u32,
    /// Position of this chunk among the chunks of its page
    pub ordinal: usize,
    /// Start offset in characters within the page text
    pub start_char: usize,
}

impl Chunk {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Split `text` into `(start_char, window)` pairs
///
/// Assumes a validated config.
pub fn chunk_text<'a>(text: &'a str, config: &ChunkingConfig) -> Vec<(usize, &'a str)> {
    // Byte offset of every char boundary, plus the end of the string
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = boundaries.len() - 1;
    let step = config.step().max(1);

    let mut windows = Vec::new();
    let mut start = 0;
    while start < char_count {
        let end = (start + config.chunk_size).min(char_count);
        windows.push((start, &text[boundaries[start]..boundaries[end]]));
        start += step;
    }
    windows
}

/// Chunk every page, preserving page order
///
/// Fails with `NoChunks` if nothing comes out, which means upstream
/// extraction produced no usable text.
pub fn chunk_pages(pages: &[Page], config: &ChunkingConfig) -> Result<Vec<Chunk>, RagError> {
    config.validate().map_err(ConfigError::Invalid)?;

    let mut chunks = Vec::new();
    for page in pages {
        for (ordinal, (start_char, window)) in chunk_text(&page.text, config).into_iter().enumerate()
        {
            chunks.push(Chunk {
                text: window.to_string(),
                source: page.source.clone(),
                page: page.number,
                ordinal,
                start_char,
            });
        }
    }

    if chunks.is_empty() {
        return Err(RagError::NoChunks { pages: pages.len() });
    }

    info!("Created {} chunks from {} pages", chunks.len(), pages.len());
    Ok(chunks)
}
