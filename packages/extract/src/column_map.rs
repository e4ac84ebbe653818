//! Header row to column map.

use std::collections::BTreeMap;

use attendance_extract_models::CanonicalField;
use attendance_pdf::Cell;

use crate::matcher::match_header;
use crate::synonyms::FieldSynonyms;

/// Zero-based column index to canonical field, for one table.
///
/// Each field appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    columns: BTreeMap<usize, CanonicalField>,
}

impl ColumnMap {
    /// Builds a map by matching each header cell left to right.
    ///
    /// A field is claimed by the first column that matches it; later
    /// columns matching the same field are ignored. An empty map means the
    /// row is not a header row.
    #[must_use]
    pub fn from_headers(headers: &[Cell], synonyms: &FieldSynonyms) -> Self {
        let mut map = Self::default();
        for (idx, header) in headers.iter().enumerate() {
            if let Some(field) = match_header(header.as_deref(), synonyms)
                && !map.contains_field(field)
            {
                map.columns.insert(idx, field);
            }
        }
        map
    }

    /// Number of mapped columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether no column was recognized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Field mapped at column `idx`.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<CanonicalField> {
        self.columns.get(&idx).copied()
    }

    /// Whether some column already claims `field`.
    #[must_use]
    pub fn contains_field(&self, field: CanonicalField) -> bool {
        self.columns.values().any(|f| *f == field)
    }

    /// Iterates `(column, field)` in column order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, CanonicalField)> + '_ {
        self.columns.iter().map(|(idx, field)| (*idx, *field))
    }
}
