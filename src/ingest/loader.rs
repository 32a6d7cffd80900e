// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Directory scan and document loading

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::pdf::{LopdfExtractor, PdfTextExtractor};
use super::{Document, Page};
use crate::rag::errors::{IngestionError, RagError};

/// List the PDF files directly inside `dir`, sorted by path
///
/// Matching is on the `pdf` extension, case-insensitive. Subdirectories are
/// not descended into.
pub fn discover_pdf_files(dir: &Path) -> Result<Vec<PathBuf>, RagError> {
    if !dir.is_dir() {
        return Err(IngestionError::DirectoryNotFound {
            path: dir.to_path_buf(),
        }
        .into());
    }

    let entries = fs::read_dir(dir).map_err(|e| IngestionError::Io {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| IngestionError::Io {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        let path = entry.path();
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if is_pdf && path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(IngestionError::NoPdfFiles {
            path: dir.to_path_buf(),
        }
        .into());
    }

    files.sort();
    info!("There are {} PDF files available in {}", files.len(), dir.display());
    Ok(files)
}

/// Keep pages with non-whitespace text, in document then page order
///
/// Fails with `EmptyCorpus` when every page is blank.
pub fn non_empty_pages(documents: &[Document]) -> Result<Vec<Page>, RagError> {
    let total: usize = documents.iter().map(Document::page_count).sum();
    let pages: Vec<Page> = documents
        .iter()
        .flat_map(|doc| doc.pages.iter())
        .filter(|page| !page.is_blank())
        .cloned()
        .collect();

    info!("Loaded {} pages, {} with text", total, pages.len());

    if pages.is_empty() {
        return Err(RagError::EmptyCorpus { pages: total });
    }
    Ok(pages)
}

/// Loads every PDF in a directory into `Document`s
#[derive(Clone)]
pub struct DocumentIngestor {
    extractor: Arc<dyn PdfTextExtractor>,
}

impl Default for DocumentIngestor {
    fn default() -> Self {
        Self::new(Arc::new(LopdfExtractor))
    }
}

impl std::fmt::Debug for DocumentIngestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentIngestor").finish_non_exhaustive()
    }
}

impl DocumentIngestor {
    pub fn new(extractor: Arc<dyn PdfTextExtractor>) -> Self {
        Self { extractor }
    }

    /// Load all PDFs in `dir`, one `Document` per file in path order
    ///
    /// A file that fails to parse aborts the whole load.
    pub fn load(&self, dir: &Path) -> Result<Vec<Document>, RagError> {
        let files = discover_pdf_files(dir)?;

        let mut documents = Vec::with_capacity(files.len());
        for path in files {
            let texts =
                self.extractor
                    .extract_pages(&path)
                    .map_err(|reason| IngestionError::Unreadable {
                        path: path.clone(),
                        reason,
                    })?;
            debug!("Extracted {} pages from {}", texts.len(), path.display());
            documents.push(Document::from_page_texts(path, texts));
        }

        info!("Loaded {} documents", documents.len());
        Ok(documents)
    }
}
