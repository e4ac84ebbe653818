//! HTTP handler functions for the attendance API.

use std::path::{Path, PathBuf};

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use attendance_export::sheets::{SheetsError, export_to_google_sheet};
use attendance_export::workbook::{XLSX_CONTENT_TYPE, export_to_excel};
use attendance_export::{ExportDefaults, ExportRecord, build_export_records};
use attendance_extract::extract_batch;
use attendance_server_models::{
    ApiError, ApiHealth, ExportRequest, ExportResponse, ExtractionResponse,
    GoogleSheetExportRequest,
};
use futures::StreamExt as _;

use crate::AppState;

/// Errors raised while receiving an upload.
#[derive(Debug, thiserror::Error)]
enum UploadError {
    #[error("Malformed upload: {0}")]
    Multipart(#[from] actix_multipart::MultipartError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/upload`
///
/// Saves the uploaded PDFs to a fresh session directory, extracts them,
/// and returns one result per PDF. The session directory is removed
/// before responding.
pub async fn upload(state: web::Data<AppState>, mut payload: Multipart) -> HttpResponse {
    let session_dir = state.upload_dir.join(uuid::Uuid::new_v4().to_string());
    log::debug!("Upload session dir: {}", session_dir.display());

    let saved = match save_uploads(&mut payload, &session_dir).await {
        Ok(saved) => saved,
        Err(e) => {
            log::warn!("Failed to receive upload: {e}");
            remove_session(&session_dir).await;
            return HttpResponse::BadRequest().json(ApiError::new(e.to_string()));
        }
    };

    if saved.received == 0 {
        log::warn!("Upload contained no files");
        remove_session(&session_dir).await;
        return HttpResponse::BadRequest().json(ApiError::new("No files provided."));
    }

    if saved.pdfs.is_empty() {
        log::warn!("No valid PDF files after filtering");
        remove_session(&session_dir).await;
        return HttpResponse::BadRequest()
            .json(ApiError::new("No valid PDF files found in upload."));
    }

    log::info!("Starting extraction on {} PDF(s)", saved.pdfs.len());
    let results = extract_batch(&saved.pdfs, &state.synonyms, &state.source, None).await;
    remove_session(&session_dir).await;

    let response = ExtractionResponse::new(results);
    log::info!(
        "Total: {} student record(s) from {} file(s)",
        response.total_students,
        response.data.len()
    );

    HttpResponse::Ok().json(response)
}

/// Files received by one upload.
struct SavedUploads {
    /// File parts seen, PDF or not.
    received: usize,
    /// Paths of the saved PDFs, in upload order.
    pdfs: Vec<PathBuf>,
}

async fn save_uploads(payload: &mut Multipart, dir: &Path) -> Result<SavedUploads, UploadError> {
    let mut saved = SavedUploads {
        received: 0,
        pdfs: Vec::new(),
    };

    while let Some(field) = payload.next().await {
        let mut field = field?;

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .and_then(|name| Path::new(name).file_name())
            .map(|name| name.to_string_lossy().into_owned());

        let mut content = Vec::new();
        while let Some(chunk) = field.next().await {
            content.extend_from_slice(&chunk?);
        }

        let Some(filename) = filename else {
            continue;
        };
        saved.received += 1;

        if !filename.to_lowercase().ends_with(".pdf") {
            log::warn!("Skipping non-PDF upload: {filename}");
            continue;
        }

        if saved.pdfs.is_empty() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let dest = dir.join(&filename);
        tokio::fs::write(&dest, &content).await?;
        log::info!("Saved upload {filename} ({} bytes)", content.len());
        saved.pdfs.push(dest);
    }

    Ok(saved)
}

async fn remove_session(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        log::warn!("Failed to remove {}: {e}", dir.display());
    }
}

fn export_records(request: &ExportRequest) -> Vec<ExportRecord> {
    let defaults = ExportDefaults {
        email: request.email.clone(),
        beneficiary: request.beneficiary.clone(),
        age_range: request.age_range.clone(),
        affiliation_type: request.affiliation_type.clone(),
        affiliation_name: request.affiliation_name.clone(),
    };
    build_export_records(request.students(), &defaults)
}

fn no_records() -> HttpResponse {
    HttpResponse::BadRequest().json(ApiError::new("No student records to export."))
}

/// `POST /api/export/excel`
///
/// Returns the records as an `.xlsx` attachment.
pub async fn export_excel(request: web::Json<ExportRequest>) -> HttpResponse {
    let records = export_records(&request);
    log::info!("Excel export: {} record(s)", records.len());

    if records.is_empty() {
        return no_records();
    }

    match export_to_excel(&records) {
        Ok(bytes) => HttpResponse::Ok()
            .content_type(XLSX_CONTENT_TYPE)
            .insert_header((
                "Content-Disposition",
                "attachment; filename=attendance_export.xlsx",
            ))
            .body(bytes),
        Err(e) => {
            log::error!("Failed to build workbook: {e}");
            HttpResponse::InternalServerError().json(ApiError::new(e.to_string()))
        }
    }
}

/// `POST /api/export/gsheet`
///
/// Writes the records to the named spreadsheet tab. Responds 404 when the
/// service account key is missing.
pub async fn export_gsheet(
    state: web::Data<AppState>,
    request: web::Json<GoogleSheetExportRequest>,
) -> HttpResponse {
    let records = export_records(&request.export);
    log::info!(
        "Google Sheets export: {} record(s) to '{}' / '{}'",
        records.len(),
        request.spreadsheet_name,
        request.worksheet_name
    );

    if records.is_empty() {
        return no_records();
    }

    match export_to_google_sheet(
        &records,
        &state.credentials_path,
        &request.spreadsheet_name,
        &request.worksheet_name,
    )
    .await
    {
        Ok(url) => {
            log::info!("Exported to {url}");
            HttpResponse::Ok().json(ExportResponse {
                success: true,
                message: format!("Exported to Google Sheets: {url}"),
            })
        }
        Err(e @ SheetsError::MissingCredentials(_)) => {
            log::error!("{e}");
            HttpResponse::NotFound().json(ApiError::new(e.to_string()))
        }
        Err(e) => {
            log::error!("Google Sheets export failed: {e}");
            HttpResponse::InternalServerError()
                .json(ApiError::new(format!("Google Sheets export failed: {e}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, test};
    use attendance_extract::FieldSynonyms;
    use attendance_pdf::memory::InMemorySource;
    use attendance_pdf::{PdfDocument, PdfPage, RawTable};

    use super::*;

    const BOUNDARY: &str = "attendance-test-boundary";

    fn roster() -> PdfDocument {
        let table: RawTable = [
            ["Lastname", "Firstname", "Gender"],
            ["Dela Cruz", "Juan", "M"],
            ["Reyes", "Maria", "F"],
        ]
        .iter()
        .map(|row| row.iter().map(|c| Some((*c).to_owned())).collect())
        .collect();
        PdfDocument::new(vec![PdfPage::new(vec![table])])
    }

    fn state(test: &str) -> web::Data<AppState> {
        web::Data::new(AppState {
            synonyms: Arc::new(FieldSynonyms::default()),
            source: Arc::new(InMemorySource::new().with_document("roster.pdf", roster())),
            credentials_path: PathBuf::from("/nonexistent/service_account.json"),
            upload_dir: std::env::temp_dir().join(format!(
                "attendance_server_{test}_{}",
                std::process::id()
            )),
        })
    }

    fn multipart_body(files: &[(&str, &str)]) -> String {
        let mut body = String::new();
        for (name, content) in files {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n{content}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body
    }

    fn upload_request(files: &[(&str, &str)]) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/upload")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(multipart_body(files))
    }

    fn export_body() -> serde_json::Value {
        serde_json::json!({
            "data": [{
                "source_file": "roster.pdf",
                "students": [
                    { "lastname": "Dela Cruz", "firstname": "Juan", "middlename": "Santos", "gender": "M" }
                ],
                "errors": []
            }],
            "beneficiary": "Youth"
        })
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app = test::init_service(App::new().configure(crate::configure)).await;
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: ApiHealth = test::call_and_read_body_json(&app, req).await;
        assert!(body.healthy);
        assert!(!body.version.is_empty());
    }

    #[actix_web::test]
    async fn upload_extracts_pdfs_and_skips_others() {
        let state = state("upload");
        let upload_dir = state.upload_dir.clone();
        let app =
            test::init_service(App::new().app_data(state).configure(crate::configure)).await;

        let req = upload_request(&[("roster.pdf", "%PDF-1.4"), ("notes.txt", "hello")]).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: ExtractionResponse = test::read_body_json(resp).await;
        assert!(body.success);
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0].source_file, "roster.pdf");
        assert_eq!(body.total_students, 2);
        assert_eq!(body.data[0].students[1].lastname, "Reyes");

        let leftover = std::fs::read_dir(&upload_dir)
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(leftover, 0);
    }

    #[actix_web::test]
    async fn upload_rejects_non_pdf_only() {
        let app = test::init_service(
            App::new()
                .app_data(state("non_pdf"))
                .configure(crate::configure),
        )
        .await;

        let req = upload_request(&[("notes.txt", "hello")]).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: ApiError = test::read_body_json(resp).await;
        assert_eq!(body.error, "No valid PDF files found in upload.");
    }

    #[actix_web::test]
    async fn upload_reports_per_file_errors() {
        let app = test::init_service(
            App::new()
                .app_data(state("per_file"))
                .configure(crate::configure),
        )
        .await;

        let req = upload_request(&[("unknown.pdf", "%PDF-1.4"), ("roster.pdf", "%PDF-1.4")])
            .to_request();
        let body: ExtractionResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.data.len(), 2);
        assert_eq!(body.data[0].source_file, "unknown.pdf");
        assert!(body.data[0].students.is_empty());
        assert!(body.data[0].errors[0].starts_with("Error processing unknown.pdf"));
        assert_eq!(body.total_students, 2);
    }

    #[actix_web::test]
    async fn excel_export_returns_attachment() {
        let app = test::init_service(App::new().configure(crate::configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/export/excel")
            .set_json(export_body())
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            XLSX_CONTENT_TYPE
        );
        assert!(
            resp.headers()
                .get("content-disposition")
                .unwrap()
                .to_str()
                .unwrap()
                .contains("attendance_export.xlsx")
        );
        let bytes = test::read_body(resp).await;
        assert!(bytes.starts_with(b"PK"));
    }

    #[actix_web::test]
    async fn excel_export_rejects_empty_data() {
        let app = test::init_service(App::new().configure(crate::configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/export/excel")
            .set_json(serde_json::json!({ "data": [] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn gsheet_export_without_credentials_is_not_found() {
        let app = test::init_service(
            App::new()
                .app_data(state("gsheet"))
                .configure(crate::configure),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/export/gsheet")
            .set_json(export_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);

        let body: ApiError = test::read_body_json(resp).await;
        assert!(body.error.contains("not found"));
    }

    #[actix_web::test]
    async fn gsheet_export_rejects_empty_data() {
        let app = test::init_service(
            App::new()
                .app_data(state("gsheet_empty"))
                .configure(crate::configure),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/export/gsheet")
            .set_json(serde_json::json!({ "data": [{ "source_file": "a.pdf", "students": [] }] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn export_without_data_field_is_a_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(state("missing_data"))
                .configure(crate::configure),
        )
        .await;

        for uri in ["/api/export/excel", "/api/export/gsheet"] {
            let req = test::TestRequest::post()
                .uri(uri)
                .set_json(serde_json::json!({}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 400, "{uri}");

            let body: ApiError = test::read_body_json(resp).await;
            assert_eq!(body.error, "No student records to export.");
        }
    }
}
