#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! PDF table source for attendance extraction.
//!
//! Exposes a parsed PDF as pages of tables of rows of nullable text cells
//! ([`PdfDocument`]). The extraction engine only consumes this shape
//! through the [`TableSource`] trait, so the PDF backend can be swapped
//! without touching the header matching or table walking logic.
//!
//! Two sources are provided:
//! - [`PdfExtractSource`] reads real files with pure-Rust content stream
//!   processing ([`pdf_extract`]) and rebuilds each page's gridded tables
//!   from glyph positions ([`layout`]).
//! - [`memory::InMemorySource`] serves pre-parsed documents.

pub mod layout;
pub mod memory;

use std::path::Path;

/// A single table cell. `None` when the backend found no text for it.
pub type Cell = Option<String>;

/// An ordered sequence of cells.
pub type TableRow = Vec<Cell>;

/// An ordered sequence of rows.
pub type RawTable = Vec<TableRow>;

/// One page of a parsed PDF.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfPage {
    /// Tables found on this page, in reading order.
    pub tables: Vec<RawTable>,
}

impl PdfPage {
    /// Creates a page from its tables.
    #[must_use]
    pub const fn new(tables: Vec<RawTable>) -> Self {
        Self { tables }
    }
}

/// A parsed PDF as an ordered sequence of pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfDocument {
    /// Pages in document order.
    pub pages: Vec<PdfPage>,
}

impl PdfDocument {
    /// Creates a document from its pages.
    #[must_use]
    pub const fn new(pages: Vec<PdfPage>) -> Self {
        Self { pages }
    }
}

/// Errors raised while opening or parsing a PDF.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// Reading the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// PDF text extraction failed.
    #[error("PDF extraction error: {0}")]
    Extraction(String),

    /// The source has no document for the requested path.
    #[error("No document available for {0}")]
    NotFound(String),
}

/// Something that can turn a PDF path into pages of raw tables.
///
/// Implementations must be shareable across worker threads; each call to
/// [`TableSource::open`] is independent.
pub trait TableSource: Send + Sync {
    /// Opens and parses the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] if the file cannot be read or parsed.
    fn open(&self, path: &Path) -> Result<PdfDocument, PdfError>;
}

/// [`TableSource`] backed by [`pdf_extract`] glyph positions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractSource;

impl TableSource for PdfExtractSource {
    fn open(&self, path: &Path) -> Result<PdfDocument, PdfError> {
        let bytes = std::fs::read(path)?;

        log::debug!("Read {} bytes from {}", bytes.len(), path.display());

        let mut doc = pdf_extract::Document::load_mem(&bytes)
            .map_err(|e| PdfError::Extraction(format!("failed to parse PDF: {e}")))?;
        if doc.is_encrypted() {
            doc.decrypt("")
                .map_err(|e| PdfError::Extraction(format!("failed to decrypt PDF: {e}")))?;
        }

        let mut collector = layout::GlyphCollector::default();
        pdf_extract::output_doc(&doc, &mut collector)
            .map_err(|e| PdfError::Extraction(format!("failed to extract text from PDF: {e}")))?;

        let pages = layout::build_pages(&collector.into_pages());

        log::debug!(
            "Found {} table(s) on {} page(s) of {}",
            pages.iter().map(|page| page.tables.len()).sum::<usize>(),
            pages.len(),
            path.display()
        );

        Ok(PdfDocument::new(pages))
    }
}
