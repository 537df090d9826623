//! Document loading: PDF pages to cleaned text chunks.
//!
//! Each page with extractable text becomes one [`TextChunk`]. Pages that
//! come back blank, or whose text cannot be extracted, are skipped; a
//! document with no usable page at all is an error.

use crate::progress::{Phase, ProgressEvent, ProgressReporter};
use crate::types::{LoadedDocument, TextChunk};
use juris_core::{AppError, AppResult, DocumentSpec};
use std::path::Path;
use std::sync::Arc;

/// Turns raw document bytes into per-page text.
pub trait PageExtractor: Send + Sync {
    /// Extract the text of every page, in page order.
    ///
    /// The result has one entry per page. A page whose text cannot be
    /// read is an empty string, so later pages keep their numbers.
    fn extract_pages(&self, bytes: &[u8]) -> AppResult<Vec<String>>;
}

/// PDF page extraction backed by `lopdf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfPageExtractor;

impl PageExtractor for PdfPageExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> AppResult<Vec<String>> {
        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| AppError::Knowledge(format!("PDF parsing failed: {}", e)))?;

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        Ok(extract_each_page(page_numbers, |n| {
            doc.extract_text(&[n])
                .map_err(|e| AppError::Knowledge(e.to_string()))
        }))
    }
}

/// Run `extract` for every page number, replacing failed pages with an
/// empty string.
pub fn extract_each_page<I, F>(page_numbers: I, mut extract: F) -> Vec<String>
where
    I: IntoIterator<Item = u32>,
    F: FnMut(u32) -> AppResult<String>,
{
    page_numbers
        .into_iter()
        .map(|n| {
            extract(n).unwrap_or_else(|e| {
                tracing::warn!(page = n, "Skipping page with unreadable text: {}", e);
                String::new()
            })
        })
        .collect()
}

/// Collapse all whitespace runs to a single space and trim.
///
/// Returns `None` when nothing but whitespace is left.
pub fn clean_text(text: &str) -> Option<String> {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Build chunks from extracted pages, numbering pages from 1 and
/// dropping blank ones.
pub fn chunks_from_pages<I, S>(source: &str, pages: I) -> Vec<TextChunk>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    pages
        .into_iter()
        .enumerate()
        .filter_map(|(i, raw)| match clean_text(raw.as_ref()) {
            Some(content) => Some(TextChunk::new(content, source, i as u32 + 1)),
            None => {
                tracing::debug!("Skipping blank page {} of '{}'", i + 1, source);
                None
            }
        })
        .collect()
}

/// Loads documents from disk through a [`PageExtractor`].
#[derive(Clone)]
pub struct DocumentLoader {
    extractor: Arc<dyn PageExtractor>,
    progress: ProgressReporter,
}

impl DocumentLoader {
    /// Loader for PDF files.
    pub fn new() -> Self {
        Self::with_extractor(Arc::new(PdfPageExtractor))
    }

    /// Loader using a custom page extractor.
    pub fn with_extractor(extractor: Arc<dyn PageExtractor>) -> Self {
        Self {
            extractor,
            progress: ProgressReporter::noop(),
        }
    }

    /// Report a progress event per loaded document.
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Load one document into page chunks.
    ///
    /// # Errors
    /// - `AppError::NotFound` if `path` does not exist
    /// - `AppError::EmptyDocument` if no page has any text
    /// - `AppError::Knowledge` if the file cannot be parsed
    pub fn load(&self, path: &Path, name: &str) -> AppResult<Vec<TextChunk>> {
        if !path.exists() {
            return Err(AppError::NotFound(path.to_path_buf()));
        }

        let bytes = std::fs::read(path)?;
        let pages = self.extractor.extract_pages(&bytes).map_err(|e| match e {
            AppError::Knowledge(msg) => AppError::Knowledge(format!("{}: {}", name, msg)),
            other => other,
        })?;
        let page_count = pages.len();

        let chunks = chunks_from_pages(name, pages);
        if chunks.is_empty() {
            return Err(AppError::EmptyDocument(name.to_string()));
        }

        tracing::info!(
            "Loaded '{}': {} of {} pages with text",
            name,
            chunks.len(),
            page_count
        );

        Ok(chunks)
    }

    /// Load every document in order and concatenate their chunks. The
    /// first failure aborts the whole load.
    pub fn load_all(&self, documents: &[DocumentSpec]) -> AppResult<Vec<TextChunk>> {
        Ok(self
            .load_documents(documents)?
            .into_iter()
            .flat_map(|doc| doc.chunks)
            .collect())
    }

    /// Like [`load_all`](Self::load_all), keeping chunks grouped per
    /// document.
    pub fn load_documents(&self, documents: &[DocumentSpec]) -> AppResult<Vec<LoadedDocument>> {
        let total = documents.len() as u64;
        let mut loaded = Vec::with_capacity(documents.len());

        for (i, doc) in documents.iter().enumerate() {
            self.progress.load(i as u64, Some(total), &doc.name);

            let chunks = self.load(&doc.path, &doc.name).map_err(|e| {
                tracing::error!("Failed to load '{}': {}", doc.name, e);
                e
            })?;

            loaded.push(LoadedDocument {
                name: doc.name.clone(),
                path: doc.path.clone(),
                chunks,
            });
        }

        self.progress.emit(ProgressEvent::new(
            Phase::Load,
            total,
            Some(total),
            format!("{} documents read", total),
        ));
        Ok(loaded)
    }
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new()
    }
}
