//! Fuzzy header matching.
//!
//! A header matches a field when one of the field's synonyms is contained
//! in the normalized header, or the normalized header is contained in the
//! synonym. The two-way test accepts abbreviations ("Ext." for
//! "extension") and verbose labels ("Last Name of Student" for "last
//! name") at the cost of occasional false positives on very short headers.
//! Callers needing strict matching should pass a narrower table.

use attendance_extract_models::CanonicalField;

use crate::synonyms::FieldSynonyms;

/// Lowercases, trims, and collapses inner whitespace.
#[must_use]
pub fn normalize_header(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Maps a raw header cell to its canonical field.
///
/// Fields are tried in table order and synonyms in declaration order; the
/// first synonym satisfying the containment test wins. Returns `None` for
/// a missing or blank header.
#[must_use]
pub fn match_header(header: Option<&str>, synonyms: &FieldSynonyms) -> Option<CanonicalField> {
    let normalized = normalize_header(header?);
    if normalized.is_empty() {
        return None;
    }

    synonyms.iter().find_map(|(field, variants)| {
        variants
            .iter()
            .any(|v| normalized.contains(v.as_str()) || v.contains(normalized.as_str()))
            .then_some(field)
    })
}
