//! Per-file progress reporting for [`crate::extract_batch`].
//!
//! The extraction engine never renders anything itself. Callers that want
//! feedback (the CLI's `indicatif` bar) pass an implementation; the server
//! passes `None`.

/// Receives one update per completed file.
///
/// Shared across the batch's blocking workers through an `Arc`, hence
/// `Send + Sync`.
pub trait ProgressCallback: Send + Sync {
    /// Sets the number of files in the batch.
    fn set_total(&self, total: u64);

    /// Marks `delta` more files as done.
    fn inc(&self, delta: u64);

    /// Shows the most recently completed file.
    fn set_message(&self, msg: String);

    /// Ends the progress display with a summary line.
    fn finish(&self, msg: String);
}
