//! # mineru-upload
//!
//! Upload documents (PDF, images, DOC/DOCX) to a MinerU parse service and
//! view the Markdown/JSON it returns.
//!
//! ## Why this crate?
//!
//! The parse service does the heavy lifting; what every front end needs on
//! top is the same small amount of glue: build the multipart request, bound
//! the wait, turn failures into one readable message, and keep the form and
//! its result cards consistent across submissions. This crate is that glue,
//! with a terminal client on top.
//!
//! ## Flow
//!
//! ```text
//! files + form
//!  │
//!  ├─ 1. Select   SelectedFile × N  (replaces the previous selection)
//!  ├─ 2. Begin    UploadView::begin_submit → clears results, Uploading
//!  ├─ 3. Send     UploadClient::submit → POST /api/v1/parse (one request)
//!  ├─ 4. Settle   UploadView::finish_submit → Success | Failed
//!  └─ 5. View     ResultCard × N  (render | markdown | json) + downloads
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mineru_upload::{SelectedFile, UploadClient, UploadView};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Base URL from MINERU_API_BASE_URL, default http://localhost:19833
//!     let client = UploadClient::from_env()?;
//!
//!     let mut view = UploadView::default();
//!     view.select_files([SelectedFile::from_path("sample.pdf")?]);
//!     view.submit(&client).await;
//!
//!     if let Some(err) = view.error() {
//!         eprintln!("{err}");
//!     }
//!     for card in view.cards() {
//!         println!("{}  {}", card.title(), card.expiry_label());
//!         println!("{}", card.render().as_str());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mineru-upload` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! mineru-upload = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod file;
pub mod options;
pub mod output;
pub mod progress;
pub mod render;
pub mod view;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{HealthLimits, HealthStatus, UploadClient};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use download::{CardDownloads, Download, DownloadSet};
pub use error::UploadError;
pub use file::{FileSelection, SelectedFile};
pub use options::{Backend, ParseMethod, UploadOptions, UploadOptionsBuilder};
pub use output::{ParseResponse, ParseResult};
pub use progress::{NoopProgressCallback, ProgressCallback, UploadProgressCallback};
pub use render::{markdown_to_safe_html, render_tab, Tab, TabContent};
pub use view::{FailureDetail, FormState, Phase, ResultCard, SubmitTicket, UploadView};
