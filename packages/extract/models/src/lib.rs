#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Student record and extraction result types.
//!
//! Every attendance PDF is reduced to an [`ExtractionResult`] holding the
//! [`StudentRecord`]s found in its tables. Results from many files are
//! flattened into [`AggregatedRecord`]s before export.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One of the five tracked semantic columns of an attendance table.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CanonicalField {
    /// Family name.
    Lastname,
    /// Given name.
    Firstname,
    /// Middle name or initial.
    Middlename,
    /// Name extension (Jr., Sr., III).
    Extension,
    /// Gender or sex.
    Gender,
}

impl CanonicalField {
    /// All canonical fields in declaration order.
    pub const ALL: &[Self] = &[
        Self::Lastname,
        Self::Firstname,
        Self::Middlename,
        Self::Extension,
        Self::Gender,
    ];
}

/// A single extracted student row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    /// Family name.
    #[serde(default)]
    pub lastname: String,
    /// Given name.
    #[serde(default)]
    pub firstname: String,
    /// Middle name or initial.
    #[serde(default)]
    pub middlename: String,
    /// Name extension.
    #[serde(default)]
    pub extension: String,
    /// Gender as written in the source document.
    #[serde(default)]
    pub gender: String,
}

impl StudentRecord {
    /// Returns the value stored for `field`.
    #[must_use]
    pub fn get(&self, field: CanonicalField) -> &str {
        match field {
            CanonicalField::Lastname => &self.lastname,
            CanonicalField::Firstname => &self.firstname,
            CanonicalField::Middlename => &self.middlename,
            CanonicalField::Extension => &self.extension,
            CanonicalField::Gender => &self.gender,
        }
    }

    /// Stores `value` for `field`.
    pub fn set(&mut self, field: CanonicalField, value: String) {
        match field {
            CanonicalField::Lastname => self.lastname = value,
            CanonicalField::Firstname => self.firstname = value,
            CanonicalField::Middlename => self.middlename = value,
            CanonicalField::Extension => self.extension = value,
            CanonicalField::Gender => self.gender = value,
        }
    }

    /// Returns `true` if every field is empty or whitespace.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        CanonicalField::ALL
            .iter()
            .all(|field| self.get(*field).trim().is_empty())
    }
}

/// Result of extracting one PDF file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// File name (without directories) of the source document.
    pub source_file: String,
    /// Students in document order.
    #[serde(default)]
    pub students: Vec<StudentRecord>,
    /// Human-readable errors encountered while extracting this file.
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ExtractionResult {
    /// Creates an empty result for `source_file`.
    #[must_use]
    pub fn new(source_file: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            students: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Creates a result carrying a single error and no students.
    #[must_use]
    pub fn failed(source_file: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            students: Vec::new(),
            errors: vec![error.into()],
        }
    }
}

/// A student record tagged with the file it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedRecord {
    /// Family name.
    pub lastname: String,
    /// Given name.
    pub firstname: String,
    /// Middle name or initial.
    pub middlename: String,
    /// Name extension.
    pub extension: String,
    /// Gender as written in the source document.
    pub gender: String,
    /// Name of the originating PDF file.
    pub source_file: String,
}

impl AggregatedRecord {
    /// Builds an aggregated record from a student and its file name.
    #[must_use]
    pub fn new(student: &StudentRecord, source_file: &str) -> Self {
        Self {
            lastname: student.lastname.clone(),
            firstname: student.firstname.clone(),
            middlename: student.middlename.clone(),
            extension: student.extension.clone(),
            gender: student.gender.clone(),
            source_file: source_file.to_owned(),
        }
    }
}
