// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PDF corpus ingestion
//!
//! Discovers `*.pdf` files in a directory, extracts text page by page and
//! drops pages with no usable text before anything is chunked or embedded.

pub mod loader;
pub mod pdf;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use loader::{discover_pdf_files, non_empty_pages, DocumentIngestor};
pub use pdf::{LopdfExtractor, PdfTextExtractor};

/// One page of extracted text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Raw extracted text
    pub text: String,
    /// 1-based page number within the source file
    pub number: u32,
    /// Path of the owning document
    pub source: PathBuf,
}

impl Page {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A PDF file and its pages in file order
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: PathBuf,
    pub pages: Vec<Page>,
}

impl Document {
    /// Build a document from per-page text, numbering pages from 1
    pub fn from_page_texts(path: PathBuf, texts: Vec<String>) -> Self {
        let pages = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Page {
                text,
                number: i as u32 + 1,
                source: path.clone(),
            })
            .collect();
        Self { path, pages }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}
