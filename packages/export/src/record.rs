//! Flat export rows.

use attendance_extract_models::StudentRecord;
use serde::{Deserialize, Serialize};

use crate::full_name::build_full_name;

/// Values broadcast to every exported row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    pub email: String,
    /// e.g. `Youth`, `Educator`, `Parent`
    pub beneficiary: String,
    /// e.g. `15-20`, `Over 35`
    pub age_range: String,
    /// e.g. `School`, `Community`, `University`
    pub affiliation_type: String,
    pub affiliation_name: String,
}

/// One exported row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub full_name: String,
    pub email: String,
    pub gender: String,
    pub beneficiary: String,
    pub age_range: String,
    pub affiliation_type: String,
    pub affiliation_name: String,
}

impl ExportRecord {
    /// Builds the row for `student` with `defaults` applied.
    #[must_use]
    pub fn new(student: &StudentRecord, defaults: &ExportDefaults) -> Self {
        Self {
            full_name: build_full_name(
                &student.lastname,
                &student.firstname,
                &student.middlename,
                &student.extension,
            ),
            email: defaults.email.clone(),
            gender: student.gender.clone(),
            beneficiary: defaults.beneficiary.clone(),
            age_range: defaults.age_range.clone(),
            affiliation_type: defaults.affiliation_type.clone(),
            affiliation_name: defaults.affiliation_name.clone(),
        }
    }

    /// Cell values in [`crate::HEADERS`] order.
    #[must_use]
    pub fn row(&self) -> [String; 7] {
        [
            self.full_name.clone(),
            self.email.clone(),
            self.gender.clone(),
            self.beneficiary.clone(),
            self.age_range.clone(),
            self.affiliation_type.clone(),
            self.affiliation_name.clone(),
        ]
    }
}

/// Builds one export row per student, in order.
pub fn build_export_records<'a>(
    students: impl IntoIterator<Item = &'a StudentRecord>,
    defaults: &ExportDefaults,
) -> Vec<ExportRecord> {
    students
        .into_iter()
        .map(|student| ExportRecord::new(student, defaults))
        .collect()
}
