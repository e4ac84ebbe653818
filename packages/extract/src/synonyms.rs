//! Header synonym tables.
//!
//! A [`FieldSynonyms`] table maps each [`CanonicalField`] to the header
//! texts that identify it. Field order and synonym order both matter: the
//! matcher returns the first field whose first satisfying synonym is
//! found. A caller-supplied table replaces the default entirely.

use std::collections::BTreeSet;

use attendance_extract_models::CanonicalField;
use serde::Deserialize;

use crate::matcher::normalize_header;

/// Errors raised while loading a synonym table.
#[derive(Debug, thiserror::Error)]
pub enum SynonymError {
    /// The TOML document could not be parsed.
    #[error("Invalid synonym table: {0}")]
    Toml(#[from] toml::de::Error),

    /// A field name is not one of the canonical fields.
    #[error("Unknown field '{0}' in synonym table")]
    UnknownField(String),

    /// The same field appears twice.
    #[error("Field '{0}' is declared more than once")]
    DuplicateField(CanonicalField),

    /// No field entries were declared.
    #[error("Synonym table declares no fields")]
    Empty,

    /// Reading the table from disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ordered mapping from canonical field to recognized header variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSynonyms {
    entries: Vec<(CanonicalField, Vec<String>)>,
}

impl Default for FieldSynonyms {
    /// The built-in table for Philippine school attendance forms.
    fn default() -> Self {
        Self::new(vec![
            (
                CanonicalField::Lastname,
                vec!["lastname", "last name", "last_name", "surname"],
            ),
            (
                CanonicalField::Firstname,
                vec!["firstname", "first name", "first_name", "given name"],
            ),
            (
                CanonicalField::Middlename,
                vec!["middlename", "middle name", "middle_name", "mi", "m.i."],
            ),
            (
                CanonicalField::Extension,
                vec!["extension", "ext", "ext.", "name extension", "suffix"],
            ),
            (CanonicalField::Gender, vec!["gender", "sex"]),
        ])
    }
}

impl FieldSynonyms {
    /// Builds a table from `(field, synonyms)` pairs, kept in the given
    /// order.
    ///
    /// Synonyms are normalized the same way headers are. Blank synonyms are
    /// dropped because an empty string is contained in every header.
    #[must_use]
    pub fn new<S: AsRef<str>>(entries: Vec<(CanonicalField, Vec<S>)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(field, synonyms)| {
                    let synonyms = synonyms
                        .iter()
                        .map(|s| normalize_header(s.as_ref()))
                        .filter(|s| !s.is_empty())
                        .collect();
                    (field, synonyms)
                })
                .collect(),
        }
    }

    /// Parses a table from TOML.
    ///
    /// ```toml
    /// [[field]]
    /// name = "lastname"
    /// synonyms = ["surname", "apelyido"]
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`SynonymError`] if the TOML is malformed, names an unknown
    /// or repeated field, or declares no fields.
    pub fn from_toml_str(input: &str) -> Result<Self, SynonymError> {
        let file: SynonymFile = toml::from_str(input)?;
        if file.field.is_empty() {
            return Err(SynonymError::Empty);
        }

        let mut seen = BTreeSet::new();
        let mut entries = Vec::with_capacity(file.field.len());
        for entry in file.field {
            let field: CanonicalField = entry
                .name
                .trim()
                .to_lowercase()
                .parse()
                .map_err(|_| SynonymError::UnknownField(entry.name.clone()))?;
            if !seen.insert(field) {
                return Err(SynonymError::DuplicateField(field));
            }
            entries.push((field, entry.synonyms));
        }

        Ok(Self::new(entries))
    }

    /// Reads and parses a TOML table from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SynonymError`] if the file cannot be read or parsed.
    pub fn from_toml_file(path: &std::path::Path) -> Result<Self, SynonymError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Iterates `(field, synonyms)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, &[String])> {
        self.entries
            .iter()
            .map(|(field, synonyms)| (*field, synonyms.as_slice()))
    }

    /// Returns the synonyms declared for `field`, if any.
    #[must_use]
    pub fn synonyms_for(&self, field: CanonicalField) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, synonyms)| synonyms.as_slice())
    }
}

#[derive(Debug, Deserialize)]
struct SynonymFile {
    #[serde(default)]
    field: Vec<SynonymEntry>,
}

#[derive(Debug, Deserialize)]
struct SynonymEntry {
    name: String,
    #[serde(default)]
    synonyms: Vec<String>,
}
