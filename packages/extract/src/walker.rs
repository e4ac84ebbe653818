//! Table walker.
//!
//! Walks every table of a document in page order and decides, table by
//! table, which rows are headers and which are data. The column map found
//! in the first recognized header is carried forward so that continuation
//! tables on later pages (which usually repeat no header) are still
//! projected. The carried map lives in an explicit [`WalkState`] value
//! owned by a single walk, so walks are independent and reentrant.

use attendance_extract_models::StudentRecord;
use attendance_pdf::{PdfDocument, RawTable, TableRow};

use crate::column_map::ColumnMap;
use crate::projector::{is_blank_row, project_row};
use crate::synonyms::FieldSynonyms;

/// Minimum recognized fields for a later table's first row to count as a
/// repeated header instead of a data row.
pub const REDECLARED_HEADER_MIN_FIELDS: usize = 2;

/// Header detection state for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WalkState {
    /// No table has produced a column map yet.
    #[default]
    NoHeaderYet,
    /// A header was recognized; its map is carried to later tables.
    HeaderEstablished(ColumnMap),
}

/// What to do with one table's rows.
struct TablePlan {
    columns: ColumnMap,
    data_start: usize,
}

/// Records found by a walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkOutcome {
    /// Non-empty records in document order.
    pub students: Vec<StudentRecord>,
    /// Whether any table produced a header.
    pub header_found: bool,
}

impl WalkState {
    /// Decides the header/data split for `table`, updating the state.
    ///
    /// `table` must have at least two rows.
    fn plan(&mut self, table: &RawTable, synonyms: &FieldSynonyms) -> Option<TablePlan> {
        match self {
            Self::NoHeaderYet => {
                let first = ColumnMap::from_headers(&table[0], synonyms);
                let (columns, data_start) = if !first.is_empty() {
                    (first, 1)
                } else if table.len() > 2 {
                    // Leading title or caption row
                    let second = ColumnMap::from_headers(&table[1], synonyms);
                    if second.is_empty() {
                        return None;
                    }
                    (second, 2)
                } else {
                    return None;
                };

                log::debug!(
                    "Header established at row {} with {} field(s)",
                    data_start - 1,
                    columns.len()
                );
                *self = Self::HeaderEstablished(columns.clone());
                Some(TablePlan {
                    columns,
                    data_start,
                })
            }
            Self::HeaderEstablished(carried) => {
                let fresh = ColumnMap::from_headers(&table[0], synonyms);
                if fresh.len() >= REDECLARED_HEADER_MIN_FIELDS {
                    log::debug!("Table re-declares a header with {} field(s)", fresh.len());
                    Some(TablePlan {
                        columns: fresh,
                        data_start: 1,
                    })
                } else {
                    Some(TablePlan {
                        columns: carried.clone(),
                        data_start: 0,
                    })
                }
            }
        }
    }

    /// Whether a header has been recognized.
    #[must_use]
    pub const fn is_established(&self) -> bool {
        matches!(self, Self::HeaderEstablished(_))
    }
}

/// Walks all pages and tables of `document`.
#[must_use]
pub fn walk_document(document: &PdfDocument, synonyms: &FieldSynonyms) -> WalkOutcome {
    let mut state = WalkState::NoHeaderYet;
    let mut students = Vec::new();

    for (page_idx, page) in document.pages.iter().enumerate() {
        for table in &page.tables {
            if table.len() < 2 {
                continue;
            }

            let Some(plan) = state.plan(table, synonyms) else {
                log::debug!("Page {}: skipping table without a header", page_idx + 1);
                continue;
            };

            collect_rows(&table[plan.data_start..], &plan.columns, &mut students);
        }
    }

    WalkOutcome {
        students,
        header_found: state.is_established(),
    }
}

fn collect_rows(rows: &[TableRow], columns: &ColumnMap, students: &mut Vec<StudentRecord>) {
    for row in rows {
        if is_blank_row(row) {
            continue;
        }
        let student = project_row(row, columns);
        if !student.is_empty() {
            students.push(student);
        }
    }
}

#[cfg(test)]
mod tests {
    use attendance_pdf::PdfPage;

    use super::*;

    fn table(rows: &[&[Option<&str>]]) -> RawTable {
        rows.iter()
            .map(|row| row.iter().map(|c| c.map(str::to_owned)).collect())
            .collect()
    }

    fn document(pages: Vec<Vec<RawTable>>) -> PdfDocument {
        PdfDocument::new(pages.into_iter().map(PdfPage::new).collect())
    }

    fn walk(doc: &PdfDocument) -> WalkOutcome {
        walk_document(doc, &FieldSynonyms::default())
    }

    fn lastnames(outcome: &WalkOutcome) -> Vec<&str> {
        outcome.students.iter().map(|s| s.lastname.as_str()).collect()
    }

    #[test]
    fn two_row_table_yields_one_record() {
        let doc = document(vec![vec![table(&[
            &[Some("No"), Some("Lastname"), Some("Firstname")],
            &[Some("1"), Some("Cruz"), Some("Ana")],
        ])]]);

        let outcome = walk(&doc);
        assert!(outcome.header_found);
        assert_eq!(outcome.students.len(), 1);
        assert_eq!(outcome.students[0].lastname, "Cruz");
        assert_eq!(outcome.students[0].firstname, "Ana");
    }

    #[test]
    fn skips_blank_and_empty_rows() {
        let doc = document(vec![vec![table(&[
            &[Some("Lastname"), Some("Firstname"), Some("Course")],
            &[Some("Cruz"), Some("Ana"), Some("BSIT")],
            &[None, None, None],
            &[Some(""), Some("  "), Some("")],
            &[],
            // Only unmapped columns filled: projects to an empty record
            &[None, None, Some("BSIT")],
        ])]]);

        let outcome = walk(&doc);
        assert_eq!(lastnames(&outcome), vec!["Cruz"]);
    }

    #[test]
    fn caption_row_before_header() {
        let doc = document(vec![vec![table(&[
            &[Some("Class Roster"), None],
            &[Some("Surname"), Some("Given Name")],
            &[Some("Reyes"), Some("Maria")],
        ])]]);

        let outcome = walk(&doc);
        assert_eq!(outcome.students.len(), 1);
        assert_eq!(outcome.students[0].firstname, "Maria");
    }

    #[test]
    fn caption_retry_needs_a_third_row() {
        let doc = document(vec![vec![table(&[
            &[Some("Class Roster")],
            &[Some("Lastname"), Some("Firstname")],
        ])]]);

        let outcome = walk(&doc);
        assert!(!outcome.header_found);
        assert!(outcome.students.is_empty());
    }

    #[test]
    fn single_row_tables_are_ignored() {
        let doc = document(vec![vec![
            table(&[&[Some("Lastname"), Some("Firstname")]]),
            table(&[&[Some("Cruz"), Some("Ana")], &[Some("Reyes"), Some("Maria")]]),
        ]]);

        let outcome = walk(&doc);
        assert!(!outcome.header_found);
        assert!(outcome.students.is_empty());
    }

    #[test]
    fn carries_header_to_continuation_pages() {
        let doc = document(vec![
            vec![table(&[
                &[Some("Lastname"), Some("Firstname"), Some("Gender")],
                &[Some("Cruz"), Some("Ana"), Some("F")],
            ])],
            vec![table(&[
                &[Some("Reyes"), Some("Maria"), Some("F")],
                &[Some("Santos"), Some("Jose"), Some("M")],
            ])],
        ]);

        let outcome = walk(&doc);
        assert_eq!(lastnames(&outcome), vec!["Cruz", "Reyes", "Santos"]);
        assert_eq!(outcome.students[2].gender, "M");
    }

    #[test]
    fn repeated_header_rows_are_not_data() {
        let header: &[Option<&str>] = &[Some("Lastname"), Some("Firstname")];
        let doc = document(vec![
            vec![table(&[header, &[Some("Cruz"), Some("Ana")]])],
            vec![table(&[header, &[Some("Reyes"), Some("Maria")]])],
        ]);

        let outcome = walk(&doc);
        assert_eq!(lastnames(&outcome), vec!["Cruz", "Reyes"]);
    }

    #[test]
    fn redeclared_header_applies_to_its_own_table_only() {
        let doc = document(vec![
            vec![table(&[
                &[Some("Lastname"), Some("Firstname")],
                &[Some("Cruz"), Some("Ana")],
            ])],
            vec![table(&[
                &[Some("Firstname"), Some("Lastname")],
                &[Some("Maria"), Some("Reyes")],
            ])],
            vec![table(&[
                &[Some("Santos"), Some("Jose")],
                &[Some("Lim"), Some("Grace")],
            ])],
        ]);

        let outcome = walk(&doc);
        assert_eq!(lastnames(&outcome), vec!["Cruz", "Reyes", "Santos", "Lim"]);
        assert_eq!(outcome.students[1].firstname, "Maria");
    }

    #[test]
    fn one_field_first_row_on_later_table_stays_data() {
        // "Mia" contains the middlename synonym "mi" but one field is below
        // the re-declaration threshold.
        let doc = document(vec![
            vec![table(&[
                &[Some("Lastname"), Some("Firstname")],
                &[Some("Cruz"), Some("Ana")],
            ])],
            vec![table(&[
                &[Some("Dizon"), Some("Mia")],
                &[Some("Lim"), Some("Grace")],
            ])],
        ]);

        let outcome = walk(&doc);
        assert_eq!(lastnames(&outcome), vec!["Cruz", "Dizon", "Lim"]);
    }

    #[test]
    fn tables_before_the_first_header_are_skipped() {
        let doc = document(vec![vec![
            table(&[&[Some("Date"), Some("Venue")], &[Some("May 5"), Some("Gym")]]),
            table(&[
                &[Some("Lastname"), Some("Firstname")],
                &[Some("Cruz"), Some("Ana")],
            ]),
        ]]);

        let outcome = walk(&doc);
        assert_eq!(lastnames(&outcome), vec!["Cruz"]);
    }

    #[test]
    fn no_tables_means_no_header() {
        let outcome = walk(&document(vec![vec![], vec![]]));
        assert!(!outcome.header_found);
        assert!(outcome.students.is_empty());
    }

    #[test]
    fn walks_are_independent() {
        let with_header = document(vec![vec![table(&[
            &[Some("Lastname"), Some("Firstname")],
            &[Some("Cruz"), Some("Ana")],
        ])]]);
        let headerless = document(vec![vec![table(&[
            &[Some("Reyes"), Some("Maria")],
            &[Some("Santos"), Some("Jose")],
        ])]]);

        assert!(walk(&with_header).header_found);
        assert!(!walk(&headerless).header_found);
    }
}
