//! Cloud spreadsheet export.
//!
//! [`export_to_sheet`] drives any [`SpreadsheetBackend`]: it opens or
//! creates the named spreadsheet and tab, clears the tab, writes the header
//! and every record in one batch, then bolds the header. The Google
//! Sheets backend lives in [`google`].

pub mod google;

use std::future::Future;
use std::path::PathBuf;

use crate::HEADERS;
use crate::record::ExportRecord;

pub use google::{GoogleSheetsBackend, export_to_google_sheet};

/// Default spreadsheet title.
pub const DEFAULT_SPREADSHEET_NAME: &str = "Attendance Export";

/// Default worksheet tab title.
pub const DEFAULT_WORKSHEET_NAME: &str = "Sheet1";

/// Errors that can occur while exporting to a cloud spreadsheet.
#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    /// The service account key file does not exist.
    #[error("Google credentials file not found: {}", .0.display())]
    MissingCredentials(PathBuf),

    /// Loading the key or obtaining an access token failed.
    #[error("Authentication error: {0}")]
    Auth(#[from] gcp_auth::Error),

    /// An HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote API rejected a request or returned an unexpected body.
    #[error("API error: {message}")]
    Api {
        /// Description of what went wrong.
        message: String,
    },
}

/// An opened spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetHandle {
    pub id: String,
    pub url: String,
}

/// A tab within a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetHandle {
    pub sheet_id: i64,
    pub title: String,
}

/// Operations a cloud spreadsheet service must provide.
pub trait SpreadsheetBackend: Send + Sync {
    /// Looks up a spreadsheet by title.
    fn find_spreadsheet(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<SpreadsheetHandle>, SheetsError>> + Send;

    /// Creates an empty spreadsheet.
    fn create_spreadsheet(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<SpreadsheetHandle, SheetsError>> + Send;

    /// Looks up a tab by title.
    fn find_worksheet(
        &self,
        spreadsheet: &SpreadsheetHandle,
        title: &str,
    ) -> impl Future<Output = Result<Option<WorksheetHandle>, SheetsError>> + Send;

    /// Adds a tab sized `rows` by `cols`.
    fn add_worksheet(
        &self,
        spreadsheet: &SpreadsheetHandle,
        title: &str,
        rows: u32,
        cols: u32,
    ) -> impl Future<Output = Result<WorksheetHandle, SheetsError>> + Send;

    /// Removes all values from a tab.
    fn clear(
        &self,
        spreadsheet: &SpreadsheetHandle,
        worksheet: &WorksheetHandle,
    ) -> impl Future<Output = Result<(), SheetsError>> + Send;

    /// Writes `rows` starting at the tab's first cell in a single request.
    fn write_rows(
        &self,
        spreadsheet: &SpreadsheetHandle,
        worksheet: &WorksheetHandle,
        rows: &[Vec<String>],
    ) -> impl Future<Output = Result<(), SheetsError>> + Send;

    /// Bolds the tab's first row.
    fn bold_header(
        &self,
        spreadsheet: &SpreadsheetHandle,
        worksheet: &WorksheetHandle,
    ) -> impl Future<Output = Result<(), SheetsError>> + Send;
}

/// Replaces the contents of `worksheet_name` in `spreadsheet_name` with
/// the header and `records`, returning the spreadsheet URL.
///
/// # Errors
///
/// Returns the first [`SheetsError`] raised by `backend`.
pub async fn export_to_sheet<B: SpreadsheetBackend>(
    backend: &B,
    records: &[ExportRecord],
    spreadsheet_name: &str,
    worksheet_name: &str,
) -> Result<String, SheetsError> {
    let spreadsheet = match backend.find_spreadsheet(spreadsheet_name).await? {
        Some(existing) => existing,
        None => {
            log::info!("Creating spreadsheet '{spreadsheet_name}'");
            backend.create_spreadsheet(spreadsheet_name).await?
        }
    };

    let worksheet = match backend.find_worksheet(&spreadsheet, worksheet_name).await? {
        Some(existing) => existing,
        None => {
            log::info!("Adding worksheet '{worksheet_name}'");
            let rows = u32::try_from(records.len() + 1).unwrap_or(u32::MAX);
            let cols = u32::try_from(HEADERS.len()).unwrap_or(u32::MAX);
            backend
                .add_worksheet(&spreadsheet, worksheet_name, rows, cols)
                .await?
        }
    };

    let rows = sheet_rows(records);

    backend.clear(&spreadsheet, &worksheet).await?;
    backend.write_rows(&spreadsheet, &worksheet, &rows).await?;
    backend.bold_header(&spreadsheet, &worksheet).await?;

    log::info!(
        "Exported {} record(s) to '{spreadsheet_name}' / '{worksheet_name}'",
        records.len()
    );

    Ok(spreadsheet.url)
}

/// Header row followed by one row per record.
fn sheet_rows(records: &[ExportRecord]) -> Vec<Vec<String>> {
    std::iter::once(HEADERS.iter().map(|h| (*h).to_owned()).collect())
        .chain(records.iter().map(|record| record.row().to_vec()))
        .collect()
}
