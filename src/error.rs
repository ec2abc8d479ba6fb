//! Error types for the mineru-upload library.
//!
//! Every failure of a submission is fatal for that submission only: the view
//! stores the message, re-enables the form, and the next attempt starts from a
//! clean slate. A single [`UploadError`] type therefore covers the whole crate.
//!
//! Three families matter to callers:
//!
//! * **Timeout / network**: [`UploadError::Timeout`] and
//!   [`UploadError::Network`]. Distinguished so a front end can say "timed out
//!   after 180s" instead of a generic failure.
//! * **Backend-reported**: [`UploadError::Backend`]. The raw body is the
//!   display message; `detail` and `request_id` are pulled out of JSON
//!   bodies so they can be shown separately.
//! * **Local**: bad paths, empty selections, invalid configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Fallback message when the backend answers non-2xx with an empty body.
pub const UPLOAD_FAILED: &str = "Upload failed";

/// All errors returned by the mineru-upload library.
#[derive(Debug, Error)]
pub enum UploadError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// `submit` was called with an empty file list.
    #[error("At least one file is required")]
    NoFiles,

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure while reading a selected file.
    #[error("Failed to read '{path}': {source}")]
    FileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Transport errors ──────────────────────────────────────────────────
    /// The backend did not answer within the configured bound.
    #[error("Request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Connection refused, DNS failure, TLS error, body read failure, …
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    ///
    /// Displays as the raw body, or [`UPLOAD_FAILED`] when the body is empty.
    #[error("{}", display_body(.body))]
    Backend {
        status: u16,
        body: String,
        /// `detail` field of a JSON error body, if any.
        detail: Option<String>,
        /// `request_id` from the JSON body or the `X-Request-ID` header.
        request_id: Option<String>,
    },

    /// A 2xx body that is not the JSON we expect.
    #[error("Invalid response from backend: {0}")]
    InvalidResponse(#[source] serde_json::Error),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write a download artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn display_body(body: &str) -> &str {
    if body.is_empty() {
        UPLOAD_FAILED
    } else {
        body
    }
}

impl UploadError {
    /// True for [`UploadError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, UploadError::Timeout { .. })
    }

    /// Message shown to the user in place of the form's error line.
    pub fn display_message(&self) -> String {
        self.to_string()
    }

    /// Build a [`UploadError::Backend`] from a status and raw body.
    ///
    /// `header_request_id` is the `X-Request-ID` response header, used when
    /// the body does not carry its own `request_id`.
    pub(crate) fn from_backend(
        status: u16,
        body: String,
        header_request_id: Option<String>,
    ) -> Self {
        let parsed = serde_json::from_str::<serde_json::Value>(&body).ok();
        let field = |name: &str| {
            parsed
                .as_ref()
                .and_then(|v| v.get(name))
                .and_then(|v| match v {
                    serde_json::Value::String(s) => Some(s.clone()),
                    serde_json::Value::Null => None,
                    other => Some(other.to_string()),
                })
        };
        let detail = field("detail");
        let request_id = field("request_id").or(header_request_id);
        UploadError::Backend {
            status,
            body,
            detail,
            request_id,
        }
    }
}
