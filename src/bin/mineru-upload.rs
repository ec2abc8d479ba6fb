//! CLI binary for mineru-upload.
//!
//! A thin shim over the library crate: CLI flags fill in the upload form,
//! the view drives one submission, and each result card is printed to stdout.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use mineru_upload::{
    Backend, ClientConfig, FormState, ParseMethod, Phase, ProgressCallback, SelectedFile, Tab,
    UploadClient, UploadProgressCallback, UploadView,
};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner while the request is in flight,
/// replaced by a one-line summary once the view settles.
struct CliProgressCallback {
    bar: ProgressBar,
    started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Uploading");

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.started
            .lock()
            .map(|s| s.map(|t| t.elapsed().as_secs_f64()).unwrap_or(0.0))
            .unwrap_or(0.0)
    }
}

impl UploadProgressCallback for CliProgressCallback {
    fn on_submit_start(&self, file_names: &[String]) {
        if let Ok(mut started) = self.started.lock() {
            *started = Some(Instant::now());
        }
        for name in file_names {
            self.bar
                .suspend(|| eprintln!("  {} Uploading {name}…", cyan("◆")));
        }
        self.bar.set_message(format!("{} file(s)", file_names.len()));
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_submit_complete(&self, outputs: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} result(s) in {:.1}s",
            green("✔"),
            bold(&outputs.to_string()),
            self.elapsed_secs()
        );
    }

    fn on_submit_error(&self, message: &str) {
        self.bar.finish_and_clear();
        // Truncate very long bodies to keep the summary on one line; the full
        // message is still printed by `main`.
        let first = message.lines().next().unwrap_or("");
        let short = if first.chars().count() > 80 {
            format!("{}\u{2026}", first.chars().take(79).collect::<String>())
        } else {
            first.to_string()
        };
        eprintln!(
            "{} {}  {}",
            red("✘"),
            red(&short),
            dim(&format!("{:.1}s", self.elapsed_secs()))
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Parse one PDF with the default pipeline backend
  mineru-upload sample.pdf

  # Several files in one request, OCR, show the JSON tab
  mineru-upload --parse-method ocr --tab json scan1.png scan2.png

  # Remote VLM through vlm-http-client
  mineru-upload --backend vlm-http-client --server-url http://127.0.0.1:1234/v1 paper.pdf

  # Save the Markdown/JSON downloads next to each other
  mineru-upload --save-dir out/ report.docx

  # Check the service is up
  mineru-upload --health-only

BACKENDS:
  pipeline (default), vlm-transformers, vlm-mlx-engine, vlm-vllm-engine,
  vlm-lmdeploy-engine, vlm-http-client (needs --server-url)

LIMITS (advertised; enforced by the service):
  up to 5 files per request, up to 50 MB each
  .pdf .png .jpg .jpeg .jp2 .webp .gif .bmp .doc .docx

ENVIRONMENT VARIABLES:
  MINERU_API_BASE_URL     Service base URL (default http://localhost:19833)
  MINERU_API_KEY          Sent as X-API-Key when the service requires auth
  MINERU_TIMEOUT_MS       Per-request timeout in milliseconds (default 180000)
"#;

/// Upload documents to a MinerU parse service and print the results.
#[derive(Parser, Debug)]
#[command(
    name = "mineru-upload",
    version,
    about = "Upload documents to a MinerU parse service and print the Markdown/JSON results",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Files to upload (PDF, images, DOC/DOCX). Sent as one request.
    #[arg(required_unless_present = "health_only")]
    files: Vec<PathBuf>,

    /// Parsing engine on the service side.
    #[arg(long, env = "MINERU_BACKEND", value_enum, default_value = "pipeline")]
    backend: BackendArg,

    /// VLM server URL; only sent with `--backend vlm-http-client`.
    #[arg(long, env = "MINERU_SERVER_URL")]
    server_url: Option<String>,

    /// Parse method: auto, txt, ocr.
    #[arg(long, env = "MINERU_PARSE_METHOD", value_enum, default_value = "auto")]
    parse_method: ParseMethodArg,

    /// Document language hint (e.g. ch, en).
    #[arg(long, env = "MINERU_LANG")]
    lang: Option<String>,

    /// First page to parse (0-based, as the service expects).
    #[arg(long)]
    start_page: Option<u32>,

    /// Last page to parse.
    #[arg(long)]
    end_page: Option<u32>,

    /// Enable formula recognition.
    #[arg(long)]
    formula_enable: Option<bool>,

    /// Enable table recognition.
    #[arg(long)]
    table_enable: Option<bool>,

    /// Service base URL.
    #[arg(long, env = "MINERU_API_BASE_URL", default_value = mineru_upload::config::DEFAULT_BASE_URL)]
    base_url: String,

    /// API key sent as X-API-Key.
    #[arg(long, env = "MINERU_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Request timeout in milliseconds.
    #[arg(long, env = "MINERU_TIMEOUT_MS", default_value_t = mineru_upload::config::DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Which view of each result to print.
    #[arg(long, env = "MINERU_TAB", value_enum, default_value = "render")]
    tab: TabArg,

    /// Write each result's Markdown/JSON downloads into this directory.
    #[arg(long, env = "MINERU_SAVE_DIR")]
    save_dir: Option<PathBuf>,

    /// Print the raw service response as JSON instead of result cards.
    #[arg(long)]
    json: bool,

    /// Probe the service's /health endpoint and exit.
    #[arg(long)]
    health_only: bool,

    /// Disable the spinner.
    #[arg(long, env = "MINERU_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MINERU_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, env = "MINERU_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    Pipeline,
    VlmTransformers,
    VlmMlxEngine,
    VlmVllmEngine,
    VlmLmdeployEngine,
    VlmHttpClient,
}

impl From<BackendArg> for Backend {
    fn from(v: BackendArg) -> Self {
        match v {
            BackendArg::Pipeline => Backend::Pipeline,
            BackendArg::VlmTransformers => Backend::VlmTransformers,
            BackendArg::VlmMlxEngine => Backend::VlmMlxEngine,
            BackendArg::VlmVllmEngine => Backend::VlmVllmEngine,
            BackendArg::VlmLmdeployEngine => Backend::VlmLmdeployEngine,
            BackendArg::VlmHttpClient => Backend::VlmHttpClient,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ParseMethodArg {
    Auto,
    Txt,
    Ocr,
}

impl From<ParseMethodArg> for ParseMethod {
    fn from(v: ParseMethodArg) -> Self {
        match v {
            ParseMethodArg::Auto => ParseMethod::Auto,
            ParseMethodArg::Txt => ParseMethod::Txt,
            ParseMethodArg::Ocr => ParseMethod::Ocr,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum TabArg {
    Render,
    Markdown,
    Json,
}

impl From<TabArg> for Tab {
    fn from(v: TabArg) -> Self {
        match v {
            TabArg::Render => Tab::Render,
            TabArg::Markdown => Tab::Markdown,
            TabArg::Json => Tab::Json,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Keep library logs out of the way while the spinner is running.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let client = UploadClient::new(build_config(&cli)?).context("Failed to create HTTP client")?;

    // ── Health-only mode ─────────────────────────────────────────────────
    if cli.health_only {
        let health = client.health().await.context("Health check failed")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&health).context("Failed to serialize health")?
            );
        } else {
            println!("Service:      {}", client.config().base_url);
            println!("Status:       {}", health.status);
            println!("MinerU ready: {}", health.mineru_ready);
            if let Some(ref t) = health.timestamp {
                println!("Timestamp:    {}", t);
            }
            if let Some(n) = health.limits.max_files {
                println!("Max files:    {}", n);
            }
            if let Some(n) = health.limits.max_file_bytes {
                println!("Max bytes:    {}", n);
            }
            if let Some(n) = health.limits.max_pages {
                println!("Max pages:    {}", n);
            }
        }
        if !health.is_ok() {
            anyhow::bail!("Service reported status {:?}", health.status);
        }
        return Ok(());
    }

    // ── Select files ─────────────────────────────────────────────────────
    let files = cli
        .files
        .iter()
        .map(|p| SelectedFile::from_path(p).with_context(|| format!("Cannot select {}", p.display())))
        .collect::<Result<Vec<_>>>()?;

    let mut view = UploadView::new(build_form(&cli));
    if show_progress {
        let cb = CliProgressCallback::new();
        view = view.with_progress(cb as ProgressCallback);
    }
    view.select_files(files);

    if !cli.quiet {
        warn_about_limits(&view);
    }

    // ── Submit ───────────────────────────────────────────────────────────
    if cli.json {
        let ticket = view.begin_submit().context("Nothing to upload")?;
        let outcome = client.submit(ticket.files(), ticket.options()).await;
        if let Ok(ref response) = outcome {
            println!(
                "{}",
                serde_json::to_string_pretty(response).context("Failed to serialise response")?
            );
        }
        if view.finish_submit(ticket, outcome) == Phase::Failed {
            bail_with_failure(&view)?;
        }
        return save_downloads(&cli, &view);
    }

    if view.submit(&client).await == Some(Phase::Failed) {
        bail_with_failure(&view)?;
    }

    // ── Print cards ──────────────────────────────────────────────────────
    view.set_all_tabs(cli.tab.into());
    print_cards(&view);

    save_downloads(&cli, &view)
}

/// Print the backend's `detail` and request id under the error, then fail.
fn bail_with_failure(view: &UploadView) -> Result<()> {
    let message = view.error().unwrap_or("Upload failed").to_string();
    if let Some(detail) = view.failure_detail() {
        if let Some(ref d) = detail.detail {
            eprintln!("{} {}", dim("detail:"), d);
        }
        if let Some(ref id) = detail.request_id {
            eprintln!("{} {}", dim("request id:"), id);
        }
    }
    anyhow::bail!(message)
}

/// Honour `--save-dir`, if given.
fn save_downloads(cli: &Cli, view: &UploadView) -> Result<()> {
    let Some(ref dir) = cli.save_dir else {
        return Ok(());
    };
    let written = view
        .download_set()
        .save_to(dir)
        .with_context(|| format!("Failed to save downloads to {}", dir.display()))?;
    if !cli.quiet {
        for path in written {
            eprintln!("  {} {}", green("↓"), path.display());
        }
    }
    Ok(())
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder()
        .base_url(&cli.base_url)
        .timeout_ms(cli.timeout_ms);
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    builder.build().context("Invalid configuration")
}

/// Map CLI args to the form fields.
fn build_form(cli: &Cli) -> FormState {
    let mut form = FormState::default();
    form.set_backend(cli.backend.into());
    if let Some(ref url) = cli.server_url {
        form.set_server_url(url);
    }
    form.set_parse_method(cli.parse_method.into());
    form.lang = cli.lang.clone();
    form.start_page = cli.start_page;
    form.end_page = cli.end_page;
    form.formula_enable = cli.formula_enable;
    form.table_enable = cli.table_enable;
    form
}

fn warn_about_limits(view: &UploadView) {
    let selection = view.selection();
    for file in selection.files().iter().filter(|f| !f.is_accepted()) {
        eprintln!(
            "{} {} is not a PDF, image or DOC/DOCX; the service may reject it",
            cyan("⚠"),
            file.name
        );
    }
    for file in selection.oversized() {
        eprintln!("{} {} is over 50 MB", cyan("⚠"), file.name);
    }
    if selection.exceeds_file_count() {
        eprintln!(
            "{} {} files selected; the service accepts up to {}",
            cyan("⚠"),
            selection.len(),
            mineru_upload::file::MAX_FILES
        );
    }
    if view.form().shows_server_url() && view.form().server_url().is_empty() {
        eprintln!("{} vlm-http-client selected without --server-url", cyan("⚠"));
    }
}

fn print_cards(view: &UploadView) {
    if let Some(msg) = view.empty_message() {
        eprintln!("{}", dim(msg));
        return;
    }
    for (index, card) in view.cards().iter().enumerate() {
        let downloads = view
            .downloads(index)
            .map(|d| d.iter().map(|x| x.file_name.as_str()).collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        println!(
            "{} {}  {}",
            cyan("■"),
            bold(card.title()),
            dim(&card.expiry_label())
        );
        println!("  {} {}", dim(&format!("[{}]", card.tab().label())), dim(&downloads));
        println!();
        println!("{}", card.render().as_str().trim_end());
        println!();
    }
}
