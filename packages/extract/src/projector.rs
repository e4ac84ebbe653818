//! Data row to [`StudentRecord`].

use attendance_extract_models::StudentRecord;
use attendance_pdf::Cell;

use crate::column_map::ColumnMap;

/// Whether every cell is missing or blank after trimming.
#[must_use]
pub fn is_blank_row(row: &[Cell]) -> bool {
    row.iter()
        .all(|cell| cell.as_deref().is_none_or(|text| text.trim().is_empty()))
}

/// Projects `row` through `columns` into a record.
///
/// Out-of-range columns and missing cells become empty strings, present
/// cells are trimmed, and unmapped fields keep their empty default. Field
/// content is not validated.
#[must_use]
pub fn project_row(row: &[Cell], columns: &ColumnMap) -> StudentRecord {
    let mut record = StudentRecord::default();
    for (idx, field) in columns.iter() {
        let value = row
            .get(idx)
            .and_then(Option::as_deref)
            .map(str::trim)
            .unwrap_or_default();
        record.set(field, value.to_owned());
    }
    record
}

#[cfg(test)]
mod tests {
    use attendance_extract_models::CanonicalField;

    use super::*;
    use crate::synonyms::FieldSynonyms;

    fn row(cells: &[Option<&str>]) -> Vec<Cell> {
        cells.iter().map(|c| c.map(str::to_owned)).collect()
    }

    fn columns(headers: &[&str]) -> ColumnMap {
        let headers: Vec<Cell> = headers.iter().map(|h| Some((*h).to_owned())).collect();
        ColumnMap::from_headers(&headers, &FieldSynonyms::default())
    }

    #[test]
    fn projects_mapped_columns() {
        let columns = columns(&[
            "No", "StudentID", "Lastname", "Firstname", "Middlename", "Extension", "Dept",
            "Course", "Gender", "TimeIn",
        ]);
        let record = project_row(
            &row(&[
                Some("1"),
                Some("2021-001"),
                Some(" Dela Cruz "),
                Some("Juan"),
                Some("Santos"),
                Some(""),
                Some("CCS"),
                Some("BSIT"),
                Some("M"),
                Some("08:00"),
            ]),
            &columns,
        );

        assert_eq!(record.lastname, "Dela Cruz");
        assert_eq!(record.firstname, "Juan");
        assert_eq!(record.middlename, "Santos");
        assert_eq!(record.extension, "");
        assert_eq!(record.gender, "M");
    }

    #[test]
    fn missing_cells_become_empty() {
        let record = project_row(&row(&[None, Some("Ana")]), &columns(&["Lastname", "Firstname"]));
        assert_eq!(record.lastname, "");
        assert_eq!(record.firstname, "Ana");
    }

    #[test]
    fn short_rows_leave_fields_empty() {
        let columns = columns(&["Lastname", "No", "Course", "TimeIn", "Dept", "Gender"]);
        assert_eq!(columns.get(5), Some(CanonicalField::Gender));

        let record = project_row(&row(&[Some("Smith")]), &columns);
        assert_eq!(record.lastname, "Smith");
        assert_eq!(record.gender, "");
    }

    #[test]
    fn blank_rows() {
        assert!(is_blank_row(&row(&[None, None, None])));
        assert!(is_blank_row(&row(&[Some(""), Some("  "), None])));
        assert!(is_blank_row(&[]));
        assert!(!is_blank_row(&row(&[None, Some("Cruz")])));
    }
}
