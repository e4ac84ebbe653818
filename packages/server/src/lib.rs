#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for attendance extraction and export.
//!
//! Accepts PDF uploads, extracts student records from them, and turns
//! previously extracted results into an `.xlsx` download or a Google
//! Sheets tab. The static frontend is served from `STATIC_DIR` when that
//! directory exists.

mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use attendance_extract::FieldSynonyms;
use attendance_pdf::{PdfExtractSource, TableSource};

/// Default path of the Google service account key.
pub const DEFAULT_CREDENTIALS_PATH: &str = "credentials/service_account.json";

/// Default directory of the static frontend.
pub const DEFAULT_STATIC_DIR: &str = "frontend";

/// Server settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    pub credentials_path: PathBuf,
    pub static_dir: PathBuf,
    /// TOML synonym table replacing the built-in one.
    pub synonyms_path: Option<PathBuf>,
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `PORT`, `GOOGLE_CREDENTIALS_PATH`, `STATIC_DIR`,
    /// and `ATTENDANCE_SYNONYMS`, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            credentials_path: lookup("GOOGLE_CREDENTIALS_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_PATH), PathBuf::from),
            static_dir: lookup("STATIC_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR), PathBuf::from),
            synonyms_path: lookup("ATTENDANCE_SYNONYMS")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Synonym table used for every upload.
    pub synonyms: Arc<FieldSynonyms>,
    /// PDF backend.
    pub source: Arc<dyn TableSource>,
    /// Google service account key for Sheets export.
    pub credentials_path: PathBuf,
    /// Parent of the per-request upload directories.
    pub upload_dir: PathBuf,
}

impl AppState {
    /// Builds the state for `config` with the `pdf-extract` backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured synonym table cannot be loaded.
    pub fn from_config(config: &ServerConfig) -> Result<Self, attendance_extract::SynonymError> {
        let synonyms = match &config.synonyms_path {
            Some(path) => {
                log::info!("Loading synonym table from {}", path.display());
                FieldSynonyms::from_toml_file(path)?
            }
            None => FieldSynonyms::default(),
        };

        Ok(Self {
            synonyms: Arc::new(synonyms),
            source: Arc::new(PdfExtractSource),
            credentials_path: config.credentials_path.clone(),
            upload_dir: std::env::temp_dir().join("attendance_uploads"),
        })
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/upload", web::post().to(handlers::upload))
            .route("/export/excel", web::post().to(handlers::export_excel))
            .route("/export/gsheet", web::post().to(handlers::export_gsheet)),
    );
}

/// Starts the attendance API server.
///
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`). The logger must already be
/// initialized.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the synonym table cannot be
/// loaded, or if the HTTP server fails to bind or encounters a runtime
/// error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let state = web::Data::new(AppState::from_config(&config).map_err(std::io::Error::other)?);

    log::info!("Upload dir   : {}", state.upload_dir.display());
    log::info!(
        "GSheet creds : {} (exists={})",
        config.credentials_path.display(),
        config.credentials_path.exists()
    );

    let static_dir = config.static_dir.is_dir().then(|| config.static_dir.clone());
    match &static_dir {
        Some(dir) => log::info!("Serving frontend from {}", dir.display()),
        None => log::warn!(
            "Frontend dir {} not found; serving API only",
            config.static_dir.display()
        ),
    }

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        let app = App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(16 * 1024 * 1024))
            .configure(configure);

        match &static_dir {
            Some(dir) => app.service(Files::new("/", dir).index_file("index.html")),
            None => app,
        }
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}
