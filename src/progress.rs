//! Progress-callback trait for submission events.
//!
//! Attach an [`Arc<dyn UploadProgressCallback>`] to an
//! [`crate::view::UploadView`] via
//! [`crate::view::UploadView::with_progress`] to hear about each submission
//! as it starts and settles. The terminal client drives its spinner from
//! these events; a GUI front end would flip its "Uploading…" banner.
//!
//! # Example
//!
//! ```rust
//! use mineru_upload::{UploadProgressCallback, UploadView};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     settled: AtomicUsize,
//! }
//!
//! impl UploadProgressCallback for CountingCallback {
//!     fn on_submit_complete(&self, outputs: usize) {
//!         self.settled.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{outputs} result(s)");
//!     }
//! }
//!
//! let view = UploadView::default()
//!     .with_progress(Arc::new(CountingCallback { settled: AtomicUsize::new(0) }));
//! ```

use std::sync::Arc;

/// Called by the view around each submission.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait UploadProgressCallback: Send + Sync {
    /// Called after the view enters `Uploading`, before the request is sent.
    ///
    /// # Arguments
    /// * `file_names`: selected files, in upload order
    fn on_submit_start(&self, file_names: &[String]) {
        let _ = file_names;
    }

    /// Called when the service answered successfully.
    ///
    /// # Arguments
    /// * `outputs`: number of result cards now shown
    fn on_submit_complete(&self, outputs: usize) {
        let _ = outputs;
    }

    /// Called when the submission failed.
    ///
    /// # Arguments
    /// * `message`: the error line now shown to the user
    fn on_submit_error(&self, message: &str) {
        let _ = message;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl UploadProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::view::UploadView`].
pub type ProgressCallback = Arc<dyn UploadProgressCallback>;
