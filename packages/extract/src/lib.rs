#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Attendance table to student record extraction.
//!
//! Locates attendance tables inside arbitrarily formatted PDFs and turns
//! their rows into [`StudentRecord`]s without per-document configuration:
//!
//! 1. [`matcher`] maps header text to canonical fields using a swappable
//!    [`FieldSynonyms`] table.
//! 2. [`column_map`] builds a column index to field map from a header row.
//! 3. [`projector`] turns one data row into a record.
//! 4. [`walker`] decides which rows are headers and carries the column map
//!    across tables and pages.
//! 5. [`batch`] runs many files on a bounded worker pool, preserving input
//!    order, and [`aggregate`] flattens the results.
//!
//! Extraction never fails as a whole: every problem becomes an error
//! string on the affected file's [`ExtractionResult`].

pub mod aggregate;
pub mod batch;
pub mod column_map;
pub mod matcher;
pub mod progress;
pub mod projector;
pub mod synonyms;
pub mod walker;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;

use attendance_pdf::{PdfDocument, TableSource};

pub use aggregate::aggregate_students;
pub use attendance_extract_models::{
    AggregatedRecord, CanonicalField, ExtractionResult, StudentRecord,
};
pub use batch::extract_batch;
pub use synonyms::{FieldSynonyms, SynonymError};

/// Extracts student records from a single PDF file.
///
/// Pre-flight checks (missing file, wrong extension, zero pages) each end
/// the extraction with a single error. Failures and panics raised while
/// opening the document are reported as `Error processing ...`. A document
/// without any recognizable header yields an empty result with a
/// `No recognisable attendance table` error.
#[must_use]
pub fn extract_from_pdf(
    path: &Path,
    synonyms: &FieldSynonyms,
    source: &dyn TableSource,
) -> ExtractionResult {
    let name = file_name(path);
    let mut result = ExtractionResult::new(name.clone());

    if !path.exists() {
        result
            .errors
            .push(format!("File not found: {}", path.display()));
        return result;
    }

    if !has_pdf_extension(path) {
        result.errors.push(format!("Not a PDF file: {name}"));
        return result;
    }

    let document = match open_document(path, source) {
        Ok(document) => document,
        Err(cause) => {
            result
                .errors
                .push(format!("Error processing {name}: {cause}"));
            return result;
        }
    };

    if document.pages.is_empty() {
        result.errors.push(format!("PDF has no pages: {name}"));
        return result;
    }

    let outcome = walker::walk_document(&document, synonyms);
    result.students = outcome.students;

    if !outcome.header_found {
        result.errors.push(format!(
            "No recognisable attendance table found in: {name}"
        ));
    }

    result
}

/// Final path component, or the whole path if it has none.
#[must_use]
pub fn file_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    )
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Opens `path`, converting backend errors and panics into a message.
fn open_document(path: &Path, source: &dyn TableSource) -> Result<PdfDocument, String> {
    match std::panic::catch_unwind(AssertUnwindSafe(|| source.open(path))) {
        Ok(Ok(document)) => Ok(document),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "PDF backend panicked".to_owned())
}
