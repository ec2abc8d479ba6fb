//! HTTP client for the parse service.
//!
//! One [`UploadClient::submit`] call is exactly one multipart `POST`: a batch
//! of files travels in a single request, nothing is retried, and the whole
//! exchange (send + body read) races a timer. When the timer wins, the request
//! future is dropped, which aborts the connection.

use crate::config::ClientConfig;
use crate::error::UploadError;
use crate::file::SelectedFile;
use crate::options::UploadOptions;
use crate::output::ParseResponse;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Header the service's optional auth layer checks.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Response header carrying the service's request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Advertised service limits, as reported by `GET /health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthLimits {
    #[serde(default)]
    pub max_file_bytes: Option<u64>,
    #[serde(default)]
    pub max_pages: Option<u32>,
    #[serde(default)]
    pub max_files: Option<u32>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub mineru_ready: bool,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub limits: HealthLimits,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Raw outcome of one HTTP exchange, before status handling.
struct RawResponse {
    status: StatusCode,
    request_id: Option<String>,
    body: String,
}

/// Thin wrapper over [`reqwest::Client`] bound to one service.
#[derive(Debug, Clone)]
pub struct UploadClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl UploadClient {
    pub fn new(config: ClientConfig) -> Result<Self, UploadError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| UploadError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    /// Client configured from `MINERU_API_BASE_URL` and friends.
    pub fn from_env() -> Result<Self, UploadError> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Upload `files` with `options` and return the parsed outputs.
    ///
    /// # Errors
    /// - [`UploadError::NoFiles`] if `files` is empty (nothing is sent)
    /// - [`UploadError::Timeout`] if no full response arrived in time
    /// - [`UploadError::Backend`] for any non-2xx status
    /// - [`UploadError::Network`] for transport failures
    /// - [`UploadError::InvalidResponse`] if a 2xx body is not JSON
    pub async fn submit(
        &self,
        files: &[SelectedFile],
        options: &UploadOptions,
    ) -> Result<ParseResponse, UploadError> {
        if files.is_empty() {
            return Err(UploadError::NoFiles);
        }

        let url = self.config.parse_url();
        info!("Uploading {} file(s) to {}", files.len(), url);

        let form = build_form(files, options)?;
        let request = self.authorize(self.http.post(&url)).multipart(form);

        let start = Instant::now();
        let raw = self.exchange(request).await?;
        debug!(
            "Parse service answered {} in {}ms ({} bytes)",
            raw.status,
            start.elapsed().as_millis(),
            raw.body.len()
        );

        if !raw.status.is_success() {
            warn!("Upload failed with HTTP {}", raw.status);
            return Err(UploadError::from_backend(
                raw.status.as_u16(),
                raw.body,
                raw.request_id,
            ));
        }

        let response: ParseResponse =
            serde_json::from_str(&raw.body).map_err(UploadError::InvalidResponse)?;
        info!(
            "Received {} output(s), {} error(s)",
            response.outputs.len(),
            response.errors.len()
        );
        Ok(response)
    }

    /// Probe `GET /health`.
    pub async fn health(&self) -> Result<HealthStatus, UploadError> {
        let url = self.config.health_url();
        debug!("Health probe: {}", url);

        let raw = self.exchange(self.authorize(self.http.get(&url))).await?;
        if !raw.status.is_success() {
            return Err(UploadError::from_backend(
                raw.status.as_u16(),
                raw.body,
                raw.request_id,
            ));
        }
        serde_json::from_str(&raw.body).map_err(UploadError::InvalidResponse)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    /// Send `request` and read the full body, bounded by the configured timeout.
    async fn exchange(&self, request: RequestBuilder) -> Result<RawResponse, UploadError> {
        let bound = Duration::from_millis(self.config.timeout_ms);
        let secs = self.config.timeout_secs_rounded();

        let call = async {
            let response = request.send().await?;
            let status = response.status();
            let request_id = response
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(RawResponse {
                status,
                request_id,
                body,
            })
        };

        match tokio::time::timeout(bound, call).await {
            Ok(Ok(raw)) => Ok(raw),
            Ok(Err(e)) if e.is_timeout() => {
                warn!("Request timed out after {}s", secs);
                Err(UploadError::Timeout { secs })
            }
            Ok(Err(e)) => {
                warn!("Request failed: {}", e);
                Err(UploadError::Network(e))
            }
            Err(_elapsed) => {
                warn!("Request timed out after {}s", secs);
                Err(UploadError::Timeout { secs })
            }
        }
    }
}

/// Encode files (in order, as repeated `files` parts) and every present
/// option into one multipart form.
pub fn build_form(files: &[SelectedFile], options: &UploadOptions) -> Result<Form, UploadError> {
    let mut form = Form::new();
    for file in files {
        let part = Part::bytes(file.content.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| {
                UploadError::Internal(format!("invalid MIME type {:?}: {e}", file.mime_type))
            })?;
        form = form.part("files", part);
    }
    for (name, value) in options.form_fields() {
        debug!("form field {}={}", name, value);
        form = form.text(name, value);
    }
    Ok(form)
}
