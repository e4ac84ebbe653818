#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Export of extracted attendance records.
//!
//! Student records are first turned into flat [`ExportRecord`]s (a composed
//! full name, the student's gender, and request-wide default values), then
//! written either to an `.xlsx` workbook ([`workbook`]) or to a cloud
//! spreadsheet ([`sheets`]). Both targets share the fixed [`HEADERS`].

pub mod full_name;
pub mod record;
pub mod sheets;
pub mod workbook;

pub use full_name::build_full_name;
pub use record::{ExportDefaults, ExportRecord, build_export_records};

/// Column headers of every export, in column order.
pub const HEADERS: [&str; 7] = [
    "Full Name",
    "Email",
    "Gender",
    "Beneficiary",
    "Age Range",
    "Affiliation Type",
    "Affiliation Name",
];

/// Errors that can occur while producing a workbook.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The workbook writer failed.
    #[error("Workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}
