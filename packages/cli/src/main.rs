#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for attendance extraction and export.
//!
//! Extracts student records from one or more attendance PDFs and prints
//! them, writes them to an `.xlsx` workbook, or pushes them to Google
//! Sheets. `serve` starts the HTTP API instead.
//!
//! Uses `indicatif-log-bridge` (via [`progress::init_logger`]) to route
//! `log` output through `indicatif::MultiProgress` so that log lines and
//! the per-file progress bar never interleave.

mod progress;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use attendance_export::sheets::{
    DEFAULT_SPREADSHEET_NAME, DEFAULT_WORKSHEET_NAME, export_to_google_sheet,
};
use attendance_export::workbook::export_to_excel;
use attendance_export::{ExportDefaults, ExportRecord, build_export_records};
use attendance_extract::{ExtractionResult, FieldSynonyms, aggregate_students, extract_batch};
use attendance_pdf::{PdfExtractSource, TableSource};
use attendance_server::{DEFAULT_CREDENTIALS_PATH, ServerConfig, run_server};
use clap::{Args, Parser, Subcommand};
use indicatif::MultiProgress;

use crate::progress::IndicatifProgress;

#[derive(Parser)]
#[command(name = "attendance", about = "PDF attendance extraction and export")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract student records and print a summary
    Extract {
        #[command(flatten)]
        input: InputArgs,
        /// Print the aggregated records as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Extract student records and write them to an `.xlsx` workbook
    ExportExcel {
        #[command(flatten)]
        input: InputArgs,
        /// Output workbook path
        #[arg(long)]
        output: PathBuf,
        #[command(flatten)]
        defaults: DefaultsArgs,
    },
    /// Extract student records and write them to a Google Sheets tab
    ExportGsheet {
        #[command(flatten)]
        input: InputArgs,
        /// Spreadsheet title, created if missing
        #[arg(long, default_value = DEFAULT_SPREADSHEET_NAME)]
        spreadsheet: String,
        /// Worksheet tab title, created if missing
        #[arg(long, default_value = DEFAULT_WORKSHEET_NAME)]
        worksheet: String,
        /// Service account key (defaults to `GOOGLE_CREDENTIALS_PATH` or
        /// `credentials/service_account.json`)
        #[arg(long)]
        credentials: Option<PathBuf>,
        #[command(flatten)]
        defaults: DefaultsArgs,
    },
    /// Start the HTTP API server
    Serve,
}

#[derive(Args)]
struct InputArgs {
    /// PDF files to extract
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// TOML synonym table replacing the built-in header synonyms
    #[arg(long)]
    synonyms: Option<PathBuf>,
}

/// Values applied to every exported row.
#[derive(Args)]
struct DefaultsArgs {
    #[arg(long, default_value = "")]
    email: String,
    /// e.g. Youth, Educator, Parent
    #[arg(long, default_value = "")]
    beneficiary: String,
    /// e.g. 15-20, Over 35
    #[arg(long, default_value = "")]
    age_range: String,
    /// e.g. School, Community, University
    #[arg(long, default_value = "")]
    affiliation_type: String,
    #[arg(long, default_value = "")]
    affiliation_name: String,
}

impl From<DefaultsArgs> for ExportDefaults {
    fn from(args: DefaultsArgs) -> Self {
        Self {
            email: args.email,
            beneficiary: args.beneficiary,
            age_range: args.age_range,
            affiliation_type: args.affiliation_type,
            affiliation_name: args.affiliation_name,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = progress::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract { input, json } => {
            let results = extract(&multi, &input).await?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&aggregate_students(&results))?
                );
            } else {
                print_summary(&results);
            }
        }
        Commands::ExportExcel {
            input,
            output,
            defaults,
        } => {
            let results = extract(&multi, &input).await?;
            let records = export_records(&results, defaults)?;
            let bytes = export_to_excel(&records)?;
            std::fs::write(&output, bytes)?;
            log::info!(
                "Wrote {} record(s) to {}",
                records.len(),
                output.display()
            );
        }
        Commands::ExportGsheet {
            input,
            spreadsheet,
            worksheet,
            credentials,
            defaults,
        } => {
            let credentials = credentials.unwrap_or_else(|| {
                std::env::var("GOOGLE_CREDENTIALS_PATH")
                    .map_or_else(|_| PathBuf::from(DEFAULT_CREDENTIALS_PATH), PathBuf::from)
            });
            let results = extract(&multi, &input).await?;
            let records = export_records(&results, defaults)?;
            let url =
                export_to_google_sheet(&records, &credentials, &spreadsheet, &worksheet).await?;
            println!("Exported to Google Sheets: {url}");
        }
        Commands::Serve => {
            let config = ServerConfig::from_env();
            // The server uses actix-web's runtime, so run it in a blocking
            // task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(run_server(config))
            })
            .await??;
        }
    }

    Ok(())
}

fn load_synonyms(path: Option<&Path>) -> Result<FieldSynonyms, attendance_extract::SynonymError> {
    path.map_or_else(
        || Ok(FieldSynonyms::default()),
        |path| {
            log::info!("Loading synonym table from {}", path.display());
            FieldSynonyms::from_toml_file(path)
        },
    )
}

async fn extract(
    multi: &MultiProgress,
    input: &InputArgs,
) -> Result<Vec<ExtractionResult>, Box<dyn std::error::Error>> {
    let synonyms = Arc::new(load_synonyms(input.synonyms.as_deref())?);
    let source: Arc<dyn TableSource> = Arc::new(PdfExtractSource);
    let progress = IndicatifProgress::files_bar(multi, "Extracting");

    let results = extract_batch(&input.files, &synonyms, &source, Some(&progress)).await;

    let total: usize = results.iter().map(|r| r.students.len()).sum();
    progress.finish(format!(
        "Extracted {total} student(s) from {} file(s)",
        results.len()
    ));

    Ok(results)
}

fn export_records(
    results: &[ExtractionResult],
    defaults: DefaultsArgs,
) -> Result<Vec<ExportRecord>, Box<dyn std::error::Error>> {
    let records = build_export_records(
        results.iter().flat_map(|r| r.students.iter()),
        &defaults.into(),
    );
    if records.is_empty() {
        return Err("No student records to export.".into());
    }
    Ok(records)
}

fn print_summary(results: &[ExtractionResult]) {
    for result in results {
        println!(
            "{}: {} student(s)",
            result.source_file,
            result.students.len()
        );
        for error in &result.errors {
            println!("  ! {error}");
        }
    }

    let total: usize = results.iter().map(|r| r.students.len()).sum();
    println!();
    println!("Total: {total} student(s) from {} file(s)", results.len());
}
