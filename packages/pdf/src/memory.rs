//! In-memory [`TableSource`] for documents that are already parsed.

use std::collections::BTreeMap;
use std::path::Path;

use crate::{PdfDocument, PdfError, TableSource};

/// Serves pre-parsed documents keyed by file name.
///
/// Lookups use the final path component only, so `/tmp/a/week1.pdf` and
/// `week1.pdf` resolve to the same document.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    documents: BTreeMap<String, PdfDocument>,
}

impl InMemorySource {
    /// Creates an empty source.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            documents: BTreeMap::new(),
        }
    }

    /// Registers `document` under `file_name`.
    #[must_use]
    pub fn with_document(mut self, file_name: &str, document: PdfDocument) -> Self {
        self.documents.insert(file_name.to_owned(), document);
        self
    }
}

impl TableSource for InMemorySource {
    fn open(&self, path: &Path) -> Result<PdfDocument, PdfError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.documents
            .get(&name)
            .cloned()
            .ok_or(PdfError::NotFound(name))
    }
}
