// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Page-level PDF text extraction

use std::path::Path;
use tracing::{debug, warn};

/// Extracts text from a PDF, one string per page in file order
///
/// Implementations must return an entry for every page, including pages
/// with no text, so page numbers stay aligned with the file.
pub trait PdfTextExtractor: Send + Sync {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, String>;
}

/// Extractor backed by `lopdf`
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

impl PdfTextExtractor for LopdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, String> {
        let document = lopdf::Document::load(path).map_err(|e| e.to_string())?;

        let pages = document.get_pages();
        debug!("{}: {} pages", path.display(), pages.len());

        let mut texts = Vec::with_capacity(pages.len());
        for page_number in pages.keys() {
            // A page whose content stream can't be decoded is treated as
            // having no text; the blank-page filter drops it later.
            match document.extract_text(&[*page_number]) {
                Ok(text) => texts.push(text),
                Err(e) => {
                    warn!(
                        "Failed to extract text from {} page {}: {}",
                        path.display(),
                        page_number,
                        e
                    );
                    texts.push(String::new());
                }
            }
        }

        Ok(texts)
    }
}
