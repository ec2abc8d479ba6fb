//! Per-submission form options.
//!
//! [`UploadOptions`] is built fresh from the form on every submission and is
//! never mutated afterwards. Every field is optional: absent fields are simply
//! not sent, and the backend applies its own defaults.

use crate::error::UploadError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Strategy hint for the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMethod {
    /// Let the backend decide per document. (default)
    #[default]
    Auto,
    /// Extract the embedded text layer.
    Txt,
    /// Run optical character recognition.
    Ocr,
}

impl ParseMethod {
    pub const ALL: [ParseMethod; 3] = [ParseMethod::Auto, ParseMethod::Txt, ParseMethod::Ocr];

    /// Wire name used in the `parse_method` form field.
    pub fn as_str(self) -> &'static str {
        match self {
            ParseMethod::Auto => "auto",
            ParseMethod::Txt => "txt",
            ParseMethod::Ocr => "ocr",
        }
    }
}

/// Parsing engine variant on the server side.
///
/// Not to be confused with the parse service itself: this selects which
/// engine *inside* the service handles the documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Classic layout + OCR pipeline. (default)
    #[default]
    Pipeline,
    VlmTransformers,
    VlmMlxEngine,
    VlmVllmEngine,
    VlmLmdeployEngine,
    /// Remote VLM reached through `server_url`.
    VlmHttpClient,
}

impl Backend {
    /// The canonical option set, in the order the form lists it.
    pub const ALL: [Backend; 6] = [
        Backend::Pipeline,
        Backend::VlmTransformers,
        Backend::VlmMlxEngine,
        Backend::VlmVllmEngine,
        Backend::VlmLmdeployEngine,
        Backend::VlmHttpClient,
    ];

    /// Wire name used in the `backend` form field.
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Pipeline => "pipeline",
            Backend::VlmTransformers => "vlm-transformers",
            Backend::VlmMlxEngine => "vlm-mlx-engine",
            Backend::VlmVllmEngine => "vlm-vllm-engine",
            Backend::VlmLmdeployEngine => "vlm-lmdeploy-engine",
            Backend::VlmHttpClient => "vlm-http-client",
        }
    }

    /// Only `vlm-http-client` reads `server_url`.
    pub fn uses_server_url(self) -> bool {
        matches!(self, Backend::VlmHttpClient)
    }
}

impl fmt::Display for ParseMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParseMethod {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParseMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UploadError::InvalidConfig(format!("unknown parse method {s:?}")))
    }
}

impl FromStr for Backend {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Backend::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UploadError::InvalidConfig(format!("unknown backend {s:?}")))
    }
}

/// Form options for one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOptions {
    pub parse_method: Option<ParseMethod>,
    pub backend: Option<Backend>,
    /// Only meaningful with [`Backend::VlmHttpClient`]. Not validated.
    pub server_url: Option<String>,
    pub lang: Option<String>,
    pub start_page: Option<u32>,
    pub end_page: Option<u32>,
    pub formula_enable: Option<bool>,
    pub table_enable: Option<bool>,
}

impl UploadOptions {
    pub fn builder() -> UploadOptionsBuilder {
        UploadOptionsBuilder {
            options: Self::default(),
        }
    }

    /// Present fields as multipart `(name, value)` pairs, in wire order.
    ///
    /// Empty strings count as absent, so an unset server URL is omitted
    /// rather than sent blank.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        fn text(v: &Option<String>) -> Option<String> {
            v.as_deref().filter(|s| !s.is_empty()).map(str::to_string)
        }

        let fields: [(&'static str, Option<String>); 8] = [
            ("lang", text(&self.lang)),
            ("parse_method", self.parse_method.map(|m| m.as_str().to_string())),
            ("backend", self.backend.map(|b| b.as_str().to_string())),
            ("server_url", text(&self.server_url)),
            ("start_page", self.start_page.map(|p| p.to_string())),
            ("end_page", self.end_page.map(|p| p.to_string())),
            ("formula_enable", self.formula_enable.map(|b| b.to_string())),
            ("table_enable", self.table_enable.map(|b| b.to_string())),
        ];
        fields
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .collect()
    }
}

/// Builder for [`UploadOptions`].
#[derive(Debug)]
pub struct UploadOptionsBuilder {
    options: UploadOptions,
}

impl UploadOptionsBuilder {
    pub fn parse_method(mut self, m: ParseMethod) -> Self {
        self.options.parse_method = Some(m);
        self
    }

    pub fn backend(mut self, b: Backend) -> Self {
        self.options.backend = Some(b);
        self
    }

    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.options.server_url = Some(url.into());
        self
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.options.lang = Some(lang.into());
        self
    }

    pub fn start_page(mut self, p: u32) -> Self {
        self.options.start_page = Some(p);
        self
    }

    pub fn end_page(mut self, p: u32) -> Self {
        self.options.end_page = Some(p);
        self
    }

    pub fn formula_enable(mut self, v: bool) -> Self {
        self.options.formula_enable = Some(v);
        self
    }

    pub fn table_enable(mut self, v: bool) -> Self {
        self.options.table_enable = Some(v);
        self
    }

    pub fn build(self) -> UploadOptions {
        self.options
    }
}
