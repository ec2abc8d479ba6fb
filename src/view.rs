//! Upload view model: the state behind the upload form and its result cards.
//!
//! ```text
//!            begin_submit (≥1 file)             finish_submit(Ok)
//!   Idle ───────────────────────────▶ Uploading ───────────────────▶ Success
//!    ▲                                    │                             │
//!    │                                    │ finish_submit(Err)          │
//!    │                                    ▼                             │
//!    └──────────── next begin_submit ── Failed ◀────────────────────────┘
//! ```
//!
//! `Success` and `Failed` both leave the form enabled; the next
//! `begin_submit` starts a new cycle from either. Results, downloads and the
//! error line are always cleared together, synchronously, before the new
//! request goes out.
//!
//! Result cards are kept in submission order and addressed by index, so two
//! files with the same name in one batch each keep their own tab.

use crate::client::UploadClient;
use crate::download::{CardDownloads, DownloadSet};
use crate::error::UploadError;
use crate::file::{FileSelection, SelectedFile};
use crate::options::{Backend, ParseMethod, UploadOptions};
use crate::output::{ParseResponse, ParseResult};
use crate::progress::{NoopProgressCallback, ProgressCallback};
use crate::render::{render_tab, Tab, TabContent};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Submit button label while idle.
pub const SUBMIT_LABEL: &str = "Upload and Parse";
/// Submit button label while a request is in flight.
pub const UPLOADING_LABEL: &str = "Uploading…";
/// Placeholder shown when there are no result cards.
pub const EMPTY_RESULTS: &str = "No results yet. Upload files to see outputs.";

/// Where the form is in its submission cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Uploading,
    Success,
    Failed,
}

/// Current values of the form's option fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    backend: Backend,
    server_url: String,
    parse_method: ParseMethod,
    pub lang: Option<String>,
    pub start_page: Option<u32>,
    pub end_page: Option<u32>,
    pub formula_enable: Option<bool>,
    pub table_enable: Option<bool>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            backend: Backend::Pipeline,
            server_url: String::new(),
            parse_method: ParseMethod::Auto,
            lang: None,
            start_page: None,
            end_page: None,
            formula_enable: None,
            table_enable: None,
        }
    }
}

impl FormState {
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Switching away from `vlm-http-client` clears the server URL.
    pub fn set_backend(&mut self, backend: Backend) {
        self.backend = backend;
        if !backend.uses_server_url() {
            self.server_url.clear();
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Whether the server URL field is shown at all.
    pub fn shows_server_url(&self) -> bool {
        self.backend.uses_server_url()
    }

    pub fn set_server_url(&mut self, url: impl Into<String>) {
        self.server_url = url.into();
    }

    pub fn parse_method(&self) -> ParseMethod {
        self.parse_method
    }

    pub fn set_parse_method(&mut self, method: ParseMethod) {
        self.parse_method = method;
    }

    /// Snapshot the fields into a fresh [`UploadOptions`].
    ///
    /// The server URL is only carried for `vlm-http-client`, and is never
    /// required: an empty one is simply not sent.
    pub fn to_options(&self) -> UploadOptions {
        UploadOptions {
            parse_method: Some(self.parse_method),
            backend: Some(self.backend),
            server_url: self
                .backend
                .uses_server_url()
                .then(|| self.server_url.clone())
                .filter(|u| !u.is_empty()),
            lang: self.lang.clone(),
            start_page: self.start_page,
            end_page: self.end_page,
            formula_enable: self.formula_enable,
            table_enable: self.table_enable,
        }
    }
}

/// One result card: the immutable result plus its view state.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultCard {
    result: ParseResult,
    tab: Tab,
}

impl ResultCard {
    fn new(result: ParseResult) -> Self {
        Self {
            result,
            tab: Tab::default(),
        }
    }

    pub fn result(&self) -> &ParseResult {
        &self.result
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn title(&self) -> &str {
        &self.result.filename
    }

    /// `Expires: …` line under the title.
    pub fn expiry_label(&self) -> String {
        format!("Expires: {}", self.result.expiry())
    }

    /// Content of the active tab.
    pub fn render(&self) -> TabContent {
        render_tab(&self.result, self.tab)
    }
}

/// Structured parts of a backend-reported failure, shown under the message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FailureDetail {
    pub status: u16,
    pub detail: Option<String>,
    pub request_id: Option<String>,
}

/// Proof that a submission is in flight: the files and options it carries.
///
/// Only [`UploadView::begin_submit`] hands these out, and
/// [`UploadView::finish_submit`] consumes one.
#[derive(Debug)]
pub struct SubmitTicket {
    files: Vec<SelectedFile>,
    options: UploadOptions,
}

impl SubmitTicket {
    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub fn options(&self) -> &UploadOptions {
        &self.options
    }
}

/// State of one upload form instance.
pub struct UploadView {
    selection: FileSelection,
    form: FormState,
    phase: Phase,
    cards: Vec<ResultCard>,
    downloads: DownloadSet,
    error: Option<String>,
    failure: Option<FailureDetail>,
    progress: ProgressCallback,
}

impl Default for UploadView {
    fn default() -> Self {
        Self {
            selection: FileSelection::default(),
            form: FormState::default(),
            phase: Phase::Idle,
            cards: Vec::new(),
            downloads: DownloadSet::default(),
            error: None,
            failure: None,
            progress: Arc::new(NoopProgressCallback),
        }
    }
}

impl fmt::Debug for UploadView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadView")
            .field("selection", &self.selection.names().collect::<Vec<_>>())
            .field("form", &self.form)
            .field("phase", &self.phase)
            .field("cards", &self.cards.len())
            .field("error", &self.error)
            .finish()
    }
}

impl UploadView {
    pub fn new(form: FormState) -> Self {
        Self {
            form,
            ..Self::default()
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    // ── Form ─────────────────────────────────────────────────────────────

    /// Single entry point for both click-to-browse and drag-and-drop.
    /// Replaces the current selection.
    pub fn select_files(&mut self, files: impl IntoIterator<Item = SelectedFile>) {
        self.selection.replace(files);
        debug!("Selection now {} file(s)", self.selection.len());
    }

    pub fn selection(&self) -> &FileSelection {
        &self.selection
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    // ── Submission cycle ─────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_uploading(&self) -> bool {
        self.phase == Phase::Uploading
    }

    /// Submit button enabled?
    pub fn can_submit(&self) -> bool {
        !self.is_uploading() && !self.selection.is_empty()
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_uploading() {
            UPLOADING_LABEL
        } else {
            SUBMIT_LABEL
        }
    }

    /// One `Uploading {name}…` line per selected file while in flight.
    pub fn status_lines(&self) -> Vec<String> {
        if !self.is_uploading() {
            return Vec::new();
        }
        self.selection
            .names()
            .map(|name| format!("Uploading {name}…"))
            .collect()
    }

    /// Start a submission.
    ///
    /// Returns `None` without touching any state when nothing is selected or
    /// a submission is already in flight. Otherwise clears results, downloads
    /// and error, enters [`Phase::Uploading`] and returns the ticket to send.
    pub fn begin_submit(&mut self) -> Option<SubmitTicket> {
        if self.is_uploading() {
            debug!("Submit ignored: upload already in flight");
            return None;
        }
        if self.selection.is_empty() {
            debug!("Submit ignored: no files selected");
            return None;
        }

        self.cards.clear();
        self.downloads = DownloadSet::default();
        self.error = None;
        self.failure = None;
        self.phase = Phase::Uploading;

        let ticket = SubmitTicket {
            files: self.selection.files().to_vec(),
            options: self.form.to_options(),
        };
        let names: Vec<String> = self.selection.names().map(str::to_string).collect();
        info!("Submitting {} file(s)", names.len());
        self.progress.on_submit_start(&names);
        Some(ticket)
    }

    /// Settle the submission `ticket` with the client's answer.
    pub fn finish_submit(
        &mut self,
        _ticket: SubmitTicket,
        outcome: Result<ParseResponse, UploadError>,
    ) -> Phase {
        match outcome {
            Ok(response) => {
                self.downloads = DownloadSet::for_results(&response.outputs);
                self.cards = response.outputs.into_iter().map(ResultCard::new).collect();
                self.phase = Phase::Success;
                self.progress.on_submit_complete(self.cards.len());
            }
            Err(err) => {
                let message = err.display_message();
                warn!("Submission failed: {}", message);
                if let UploadError::Backend {
                    status,
                    detail,
                    request_id,
                    ..
                } = &err
                {
                    self.failure = Some(FailureDetail {
                        status: *status,
                        detail: detail.clone(),
                        request_id: request_id.clone(),
                    });
                }
                self.cards.clear();
                self.progress.on_submit_error(&message);
                self.error = Some(message);
                self.phase = Phase::Failed;
            }
        }
        self.phase
    }

    /// `begin_submit` + `client.submit` + `finish_submit`.
    ///
    /// Returns `None` when the submission was a no-op.
    pub async fn submit(&mut self, client: &UploadClient) -> Option<Phase> {
        let ticket = self.begin_submit()?;
        let outcome = client.submit(ticket.files(), ticket.options()).await;
        Some(self.finish_submit(ticket, outcome))
    }

    // ── Results ──────────────────────────────────────────────────────────

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn failure_detail(&self) -> Option<&FailureDetail> {
        self.failure.as_ref()
    }

    pub fn cards(&self) -> &[ResultCard] {
        &self.cards
    }

    /// Placeholder text when there is nothing to show.
    pub fn empty_message(&self) -> Option<&'static str> {
        self.cards.is_empty().then_some(EMPTY_RESULTS)
    }

    /// Switch the tab of card `index`. Returns `false` for a bad index.
    pub fn set_tab(&mut self, index: usize, tab: Tab) -> bool {
        match self.cards.get_mut(index) {
            Some(card) => {
                card.tab = tab;
                true
            }
            None => false,
        }
    }

    /// Set every card to `tab`.
    pub fn set_all_tabs(&mut self, tab: Tab) {
        for card in &mut self.cards {
            card.tab = tab;
        }
    }

    pub fn render_card(&self, index: usize) -> Option<TabContent> {
        self.cards.get(index).map(ResultCard::render)
    }

    pub fn downloads(&self, index: usize) -> Option<&CardDownloads> {
        self.downloads.card(index)
    }

    pub fn download_set(&self) -> &DownloadSet {
        &self.downloads
    }

    /// Write the current downloads to a scoped temp directory, released on
    /// the next submission or when the view is dropped.
    pub fn materialize_downloads(&mut self) -> Result<&[Vec<PathBuf>], UploadError> {
        self.downloads.materialize()
    }
}
