#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the attendance extraction server.
//!
//! Export requests carry previously extracted results back to the server
//! together with values applied to every exported row.

use attendance_extract_models::{ExtractionResult, StudentRecord};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Response of `POST /api/upload`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResponse {
    pub success: bool,
    /// One entry per uploaded PDF, in upload order.
    #[serde(default)]
    pub data: Vec<ExtractionResult>,
    #[serde(default)]
    pub total_students: usize,
}

impl ExtractionResponse {
    /// Wraps `data`, counting its students.
    #[must_use]
    pub fn new(data: Vec<ExtractionResult>) -> Self {
        let total_students = data.iter().map(|r| r.students.len()).sum();
        Self {
            success: true,
            data,
            total_students,
        }
    }
}

/// Body of `POST /api/export/excel`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Results from a previous upload.
    #[serde(default)]
    pub data: Vec<ExtractionResult>,
    #[serde(default)]
    pub email: String,
    /// `Youth`, `Educator`, or `Parent`
    #[serde(default)]
    pub beneficiary: String,
    /// `15-20`, `21-25`, `26-30`, `31-35`, or `Over 35`
    #[serde(default)]
    pub age_range: String,
    /// `School`, `Community`, `Workplace`, or `University`
    #[serde(default)]
    pub affiliation_type: String,
    #[serde(default)]
    pub affiliation_name: String,
}

impl ExportRequest {
    /// Every student across all results, in file order.
    pub fn students(&self) -> impl Iterator<Item = &StudentRecord> {
        self.data.iter().flat_map(|r| r.students.iter())
    }
}

fn default_spreadsheet_name() -> String {
    "Attendance Export".to_string()
}

fn default_worksheet_name() -> String {
    "Sheet1".to_string()
}

/// Body of `POST /api/export/gsheet`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleSheetExportRequest {
    #[serde(flatten)]
    pub export: ExportRequest,
    #[serde(default = "default_spreadsheet_name")]
    pub spreadsheet_name: String,
    #[serde(default = "default_worksheet_name")]
    pub worksheet_name: String,
}

/// Response of the export endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}
