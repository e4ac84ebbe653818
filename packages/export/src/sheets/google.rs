//! Google Sheets backend.
//!
//! Spreadsheets are located by title through the Drive v3 files API and
//! edited through the Sheets v4 API. Requests are authorized with a
//! service account key; `gcp_auth` caches and refreshes the access token.

use std::path::Path;
use std::sync::Arc;

use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::Url;
use serde::de::DeserializeOwned;

use super::{SheetsError, SpreadsheetBackend, SpreadsheetHandle, WorksheetHandle, export_to_sheet};
use crate::record::ExportRecord;

const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

const SHEETS_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// [`SpreadsheetBackend`] for Google Sheets.
pub struct GoogleSheetsBackend {
    auth: Arc<dyn TokenProvider>,
    client: reqwest::Client,
}

impl GoogleSheetsBackend {
    /// Creates a backend authorized by the service account key at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::MissingCredentials`] if `path` does not exist
    /// and [`SheetsError::Auth`] if the key cannot be loaded.
    pub fn from_service_account_file(path: &Path) -> Result<Self, SheetsError> {
        if !path.exists() {
            return Err(SheetsError::MissingCredentials(path.to_path_buf()));
        }

        let account = CustomServiceAccount::from_file(path)?;
        Ok(Self {
            auth: Arc::new(account),
            client: reqwest::Client::new(),
        })
    }

    async fn bearer(&self) -> Result<String, SheetsError> {
        let token = self.auth.token(SCOPES).await?;
        Ok(format!("Bearer {}", token.as_str()))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, SheetsError> {
        let resp = request
            .header("Authorization", self.bearer().await?)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| {
                    v.pointer("/error/message")
                        .and_then(serde_json::Value::as_str)
                        .map(String::from)
                })
                .unwrap_or(body);
            return Err(SheetsError::Api {
                message: format!("{status}: {message}"),
            });
        }

        serde_json::from_str(&body).map_err(|e| SheetsError::Api {
            message: format!("Unexpected response body: {e}"),
        })
    }

    async fn batch_update(
        &self,
        spreadsheet: &SpreadsheetHandle,
        requests: serde_json::Value,
    ) -> Result<serde_json::Value, SheetsError> {
        let url = format!("{SHEETS_BASE}/{}:batchUpdate", spreadsheet.id);
        self.send(
            self.client
                .post(url)
                .json(&serde_json::json!({ "requests": requests })),
        )
        .await
    }
}

/// Builds `{SHEETS_BASE}/{id}/values/{range}{suffix}` with the range
/// percent-encoded as one path segment.
fn values_url(spreadsheet_id: &str, range: &str, suffix: &str) -> Result<Url, SheetsError> {
    let mut url = Url::parse(SHEETS_BASE).map_err(|e| SheetsError::Api {
        message: e.to_string(),
    })?;
    url.path_segments_mut()
        .map_err(|()| SheetsError::Api {
            message: format!("Cannot build values URL for {spreadsheet_id}"),
        })?
        .extend([spreadsheet_id, "values", &format!("{range}{suffix}")]);
    Ok(url)
}

/// A1 range covering a whole tab.
fn quoted_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Drive query matching a spreadsheet titled `name`.
fn title_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!("name = '{escaped}' and mimeType = '{SPREADSHEET_MIME}' and trashed = false")
}

fn spreadsheet_url(id: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{id}")
}

fn worksheet_from_properties(
    properties: Option<&serde_json::Value>,
) -> Result<WorksheetHandle, SheetsError> {
    let properties = properties.ok_or_else(|| SheetsError::Api {
        message: "Missing sheet properties in response".to_string(),
    })?;

    Ok(WorksheetHandle {
        sheet_id: properties
            .get("sheetId")
            .and_then(serde_json::Value::as_i64)
            .unwrap_or(0),
        title: properties
            .get("title")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_owned(),
    })
}

impl SpreadsheetBackend for GoogleSheetsBackend {
    async fn find_spreadsheet(&self, name: &str) -> Result<Option<SpreadsheetHandle>, SheetsError> {
        let body: serde_json::Value = self
            .send(self.client.get(DRIVE_FILES).query(&[
                ("q", title_query(name).as_str()),
                ("fields", "files(id,name)"),
                ("pageSize", "1"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ]))
            .await?;

        Ok(body
            .pointer("/files/0/id")
            .and_then(serde_json::Value::as_str)
            .map(|id| SpreadsheetHandle {
                id: id.to_owned(),
                url: spreadsheet_url(id),
            }))
    }

    async fn create_spreadsheet(&self, name: &str) -> Result<SpreadsheetHandle, SheetsError> {
        let body: serde_json::Value = self
            .send(
                self.client
                    .post(SHEETS_BASE)
                    .json(&serde_json::json!({ "properties": { "title": name } })),
            )
            .await?;

        let id = body
            .get("spreadsheetId")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| SheetsError::Api {
                message: "Missing spreadsheetId in create response".to_string(),
            })?;

        Ok(SpreadsheetHandle {
            id: id.to_owned(),
            url: body
                .get("spreadsheetUrl")
                .and_then(serde_json::Value::as_str)
                .map_or_else(|| spreadsheet_url(id), String::from),
        })
    }

    async fn find_worksheet(
        &self,
        spreadsheet: &SpreadsheetHandle,
        title: &str,
    ) -> Result<Option<WorksheetHandle>, SheetsError> {
        let body: serde_json::Value = self
            .send(
                self.client
                    .get(format!("{SHEETS_BASE}/{}", spreadsheet.id))
                    .query(&[("fields", "sheets.properties(sheetId,title)")]),
            )
            .await?;

        let sheets = body
            .get("sheets")
            .and_then(serde_json::Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        sheets
            .iter()
            .map(|sheet| worksheet_from_properties(sheet.get("properties")))
            .find(|ws| ws.as_ref().is_ok_and(|ws| ws.title == title))
            .transpose()
    }

    async fn add_worksheet(
        &self,
        spreadsheet: &SpreadsheetHandle,
        title: &str,
        rows: u32,
        cols: u32,
    ) -> Result<WorksheetHandle, SheetsError> {
        let body = self
            .batch_update(
                spreadsheet,
                serde_json::json!([{
                    "addSheet": {
                        "properties": {
                            "title": title,
                            "gridProperties": { "rowCount": rows, "columnCount": cols },
                        }
                    }
                }]),
            )
            .await?;

        worksheet_from_properties(body.pointer("/replies/0/addSheet/properties"))
    }

    async fn clear(
        &self,
        spreadsheet: &SpreadsheetHandle,
        worksheet: &WorksheetHandle,
    ) -> Result<(), SheetsError> {
        let url = values_url(&spreadsheet.id, &quoted_title(&worksheet.title), ":clear")?;
        let _: serde_json::Value = self
            .send(self.client.post(url).json(&serde_json::json!({})))
            .await?;
        Ok(())
    }

    async fn write_rows(
        &self,
        spreadsheet: &SpreadsheetHandle,
        worksheet: &WorksheetHandle,
        rows: &[Vec<String>],
    ) -> Result<(), SheetsError> {
        let range = format!("{}!A1", quoted_title(&worksheet.title));
        let url = values_url(&spreadsheet.id, &range, "")?;
        let _: serde_json::Value = self
            .send(
                self.client
                    .put(url)
                    .query(&[("valueInputOption", "USER_ENTERED")])
                    .json(&serde_json::json!({
                        "range": range,
                        "majorDimension": "ROWS",
                        "values": rows,
                    })),
            )
            .await?;
        Ok(())
    }

    async fn bold_header(
        &self,
        spreadsheet: &SpreadsheetHandle,
        worksheet: &WorksheetHandle,
    ) -> Result<(), SheetsError> {
        self.batch_update(
            spreadsheet,
            serde_json::json!([{
                "repeatCell": {
                    "range": {
                        "sheetId": worksheet.sheet_id,
                        "startRowIndex": 0,
                        "endRowIndex": 1,
                    },
                    "cell": { "userEnteredFormat": { "textFormat": { "bold": true } } },
                    "fields": "userEnteredFormat.textFormat.bold",
                }
            }]),
        )
        .await?;
        Ok(())
    }
}

/// Exports `records` to Google Sheets using the service account key at
/// `credentials_path`, returning the spreadsheet URL.
///
/// The key file is checked before any network call.
///
/// # Errors
///
/// Returns [`SheetsError::MissingCredentials`] if the key file is missing,
/// or another [`SheetsError`] if authentication or an API call fails.
pub async fn export_to_google_sheet(
    records: &[ExportRecord],
    credentials_path: &Path,
    spreadsheet_name: &str,
    worksheet_name: &str,
) -> Result<String, SheetsError> {
    log::info!("Using Google credentials at {}", credentials_path.display());
    let backend = GoogleSheetsBackend::from_service_account_file(credentials_path)?;
    export_to_sheet(&backend, records, spreadsheet_name, worksheet_name).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_credentials_fail_before_network() {
        let err = export_to_google_sheet(
            &[],
            Path::new("/nonexistent/service_account.json"),
            "Attendance Export",
            "Sheet1",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, SheetsError::MissingCredentials(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn values_url_encodes_the_range() {
        let url = values_url("abc123", &quoted_title("Week 1"), ":clear").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/'Week%201':clear"
        );
    }

    #[test]
    fn titles_are_escaped() {
        assert_eq!(quoted_title("Juan's"), "'Juan''s'");
        assert_eq!(
            title_query("O'Brien"),
            "name = 'O\\'Brien' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false"
        );
    }

    #[test]
    fn parses_sheet_properties() {
        let props = serde_json::json!({ "sheetId": 42, "title": "Roster" });
        let ws = worksheet_from_properties(Some(&props)).unwrap();
        assert_eq!(ws.sheet_id, 42);
        assert_eq!(ws.title, "Roster");
        assert!(worksheet_from_properties(None).is_err());
    }
}
