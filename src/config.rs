//! Client configuration.
//!
//! Everything the [`crate::client::UploadClient`] needs to reach a backend
//! lives in [`ClientConfig`], built via its [`ClientConfigBuilder`] or read
//! from the environment with [`ClientConfig::from_env`]. Per-submission form
//! fields are *not* here; they belong to [`crate::options::UploadOptions`].

use crate::error::UploadError;
use std::fmt;

/// Base URL used when `MINERU_API_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "http://localhost:19833";

/// Bounded wait for one submission, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 180_000;

/// Environment variable holding the backend base URL.
pub const ENV_BASE_URL: &str = "MINERU_API_BASE_URL";
/// Environment variable holding the optional `X-API-Key` value.
pub const ENV_API_KEY: &str = "MINERU_API_KEY";
/// Environment variable overriding the submission timeout.
pub const ENV_TIMEOUT_MS: &str = "MINERU_TIMEOUT_MS";

/// Configuration for an [`crate::client::UploadClient`].
///
/// # Example
/// ```rust
/// use mineru_upload::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://parser.internal:19833/")
///     .timeout_ms(60_000)
///     .build()
///     .unwrap();
/// assert_eq!(config.base_url, "http://parser.internal:19833");
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Scheme + host (+ optional path prefix) of the parse service, without a
    /// trailing slash. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Upper bound on one `submit` call, covering send and body read.
    /// Default: 180 000 ms.
    ///
    /// Multi-file parses on the pipeline backend routinely take a minute or
    /// more; the bound only exists so a hung backend does not leave the form
    /// disabled forever.
    pub timeout_ms: u64,

    /// Sent as `X-API-Key` when the backend has auth enabled.
    pub api_key: Option<String>,

    /// `User-Agent` header for every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            api_key: None,
            user_agent: concat!("mineru-upload/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Read `MINERU_API_BASE_URL`, `MINERU_API_KEY` and `MINERU_TIMEOUT_MS`,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, UploadError> {
        let mut builder = Self::builder();
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            if !url.trim().is_empty() {
                builder = builder.base_url(url);
            }
        }
        if let Ok(key) = std::env::var(ENV_API_KEY) {
            if !key.is_empty() {
                builder = builder.api_key(key);
            }
        }
        if let Ok(raw) = std::env::var(ENV_TIMEOUT_MS) {
            let ms = raw.trim().parse::<u64>().map_err(|_| {
                UploadError::InvalidConfig(format!("{ENV_TIMEOUT_MS} must be an integer, got {raw:?}"))
            })?;
            builder = builder.timeout_ms(ms);
        }
        builder.build()
    }

    /// `POST` target for uploads.
    pub fn parse_url(&self) -> String {
        format!("{}/api/v1/parse", self.base_url)
    }

    /// `GET` target for the health probe.
    pub fn health_url(&self) -> String {
        format!("{}/health", self.base_url)
    }

    /// Timeout rounded to whole seconds, as reported in timeout errors.
    pub fn timeout_secs_rounded(&self) -> u64 {
        (self.timeout_ms as f64 / 1000.0).round() as u64
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.config.base_url = url.trim().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeout_ms = ms;
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, UploadError> {
        let c = &self.config;
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(UploadError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got {:?}",
                c.base_url
            )));
        }
        if c.timeout_ms == 0 {
            return Err(UploadError::InvalidConfig(
                "Timeout must be ≥ 1 ms".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_dev_server() {
        let c = ClientConfig::default();
        assert_eq!(c.base_url, DEFAULT_BASE_URL);
        assert_eq!(c.timeout_ms, 180_000);
        assert_eq!(c.parse_url(), "http://localhost:19833/api/v1/parse");
        assert_eq!(c.health_url(), "http://localhost:19833/health");
    }

    #[test]
    fn builder_trims_trailing_slash() {
        let c = ClientConfig::builder()
            .base_url("https://mineru.example.com/")
            .build()
            .unwrap();
        assert_eq!(c.parse_url(), "https://mineru.example.com/api/v1/parse");
    }

    #[test]
    fn builder_rejects_non_http_url() {
        let err = ClientConfig::builder().base_url("ftp://x").build().unwrap_err();
        assert!(matches!(err, UploadError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        let err = ClientConfig::builder().timeout_ms(0).build().unwrap_err();
        assert!(err.to_string().contains("Timeout"));
    }

    #[test]
    fn timeout_seconds_round_like_the_form() {
        let c = ClientConfig::builder().timeout_ms(1_500).build().unwrap();
        assert_eq!(c.timeout_secs_rounded(), 2);
        let c = ClientConfig::builder().timeout_ms(180_000).build().unwrap();
        assert_eq!(c.timeout_secs_rounded(), 180);
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = ClientConfig::builder().api_key("s3cret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("s3cret"));
        assert!(dbg.contains("<redacted>"));
    }
}
