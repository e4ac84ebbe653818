//! Concurrent extraction over many files.
//!
//! Each file, a lone one included, is extracted on tokio's blocking pool
//! because PDF parsing is CPU bound. At most one task per available core
//! runs at a time, and the results come back in input order regardless of
//! completion order.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use attendance_extract_models::ExtractionResult;
use attendance_pdf::TableSource;
use futures::StreamExt;

use crate::progress::ProgressCallback;
use crate::synonyms::FieldSynonyms;
use crate::{extract_from_pdf, file_name, panic_message};

/// Default worker count when the core count is unavailable.
const FALLBACK_WORKERS: usize = 4;

/// Extracts every file in `paths`, returning one result per input path in
/// the same order.
///
/// A failure in one file, including a panic inside the PDF backend, is
/// confined to that file's result.
pub async fn extract_batch(
    paths: &[PathBuf],
    synonyms: &Arc<FieldSynonyms>,
    source: &Arc<dyn TableSource>,
    progress: Option<&Arc<dyn ProgressCallback>>,
) -> Vec<ExtractionResult> {
    let total = paths.len();
    if let Some(p) = progress {
        p.set_total(total as u64);
    }

    if total <= 1 {
        let mut results = Vec::with_capacity(total);
        for path in paths {
            let result = extract_blocking(path.clone(), synonyms, source).await;
            report(&result, progress);
            results.push(result);
        }
        return results;
    }

    let workers = std::thread::available_parallelism()
        .map_or(FALLBACK_WORKERS, NonZeroUsize::get)
        .min(total);
    log::info!("Extracting {total} file(s) with {workers} worker(s)");

    let mut slots: Vec<Option<ExtractionResult>> = (0..total).map(|_| None).collect();

    let stream = futures::stream::iter(paths.iter().cloned().enumerate())
        .map(|(idx, path)| async move { (idx, extract_blocking(path, synonyms, source).await) })
        .buffer_unordered(workers);

    let mut stream = std::pin::pin!(stream);
    while let Some((idx, result)) = stream.next().await {
        report(&result, progress);
        slots[idx] = Some(result);
    }

    slots
        .into_iter()
        .zip(paths)
        .map(|(slot, path)| {
            slot.unwrap_or_else(|| {
                let name = file_name(path);
                ExtractionResult::failed(name.clone(), format!("Error processing {name}: not run"))
            })
        })
        .collect()
}

/// Runs [`extract_from_pdf`] on tokio's blocking pool. A task that fails to
/// join becomes that file's error.
async fn extract_blocking(
    path: PathBuf,
    synonyms: &Arc<FieldSynonyms>,
    source: &Arc<dyn TableSource>,
) -> ExtractionResult {
    let name = file_name(&path);
    let synonyms = Arc::clone(synonyms);
    let source = Arc::clone(source);

    match tokio::task::spawn_blocking(move || extract_from_pdf(&path, &synonyms, source.as_ref()))
        .await
    {
        Ok(result) => result,
        Err(e) => {
            let cause = if e.is_panic() {
                panic_message(e.into_panic().as_ref())
            } else {
                e.to_string()
            };
            ExtractionResult::failed(name.clone(), format!("Error processing {name}: {cause}"))
        }
    }
}

fn report(result: &ExtractionResult, progress: Option<&Arc<dyn ProgressCallback>>) {
    log::info!(
        "{}: {} student(s), {} error(s)",
        result.source_file,
        result.students.len(),
        result.errors.len()
    );
    for error in &result.errors {
        log::warn!("{error}");
    }

    if let Some(p) = progress {
        p.set_message(result.source_file.clone());
        p.inc(1);
    }
}
