//! Flattening of per-file results.

use attendance_extract_models::{AggregatedRecord, ExtractionResult};

/// Flattens `results` into one record per student, tagged with the
/// originating file name.
///
/// Order is file order, then in-file student order.
#[must_use]
pub fn aggregate_students(results: &[ExtractionResult]) -> Vec<AggregatedRecord> {
    results
        .iter()
        .flat_map(|result| {
            result
                .students
                .iter()
                .map(|student| AggregatedRecord::new(student, &result.source_file))
        })
        .collect()
}
