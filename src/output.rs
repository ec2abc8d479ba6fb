//! Response types returned by the parse service.
//!
//! Deserialisation is deliberately lenient: the service is trusted to send an
//! `outputs` array, a missing or `null` array means "no results", and unknown
//! fields (`markdown_url`, `middle_json_url`, …) are ignored.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Treat an explicit `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of a successful `POST /api/v1/parse`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseResponse {
    /// One entry per uploaded file, in upload order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub outputs: Vec<ParseResult>,

    /// Per-file errors reported alongside successful outputs.
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<Value>,

    #[serde(default)]
    pub request_id: Option<String>,
}

/// Parsed output for one uploaded file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub filename: String,

    #[serde(default)]
    pub markdown: Option<String>,

    #[serde(default)]
    pub content_list_json: Option<Value>,

    #[serde(default)]
    pub middle_json: Option<Value>,

    #[serde(default)]
    pub model_output_json: Option<Value>,

    /// Display-only expiry of the server-side copy. Usually an RFC 3339
    /// string, but any JSON value is accepted and shown as-is.
    #[serde(default)]
    pub storage_expiry: Option<Value>,
}

fn is_empty_value(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Object(m) => m.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

impl ParseResult {
    /// First non-empty payload among `content_list_json`, `middle_json` and
    /// `model_output_json`; `{}` when all are empty.
    pub fn json_payload(&self) -> Value {
        [
            &self.content_list_json,
            &self.middle_json,
            &self.model_output_json,
        ]
        .into_iter()
        .flatten()
        .find(|v| !is_empty_value(v))
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()))
    }

    /// [`Self::json_payload`] pretty-printed with two-space indentation.
    pub fn pretty_json(&self) -> String {
        // Serialising a `Value` cannot fail.
        serde_json::to_string_pretty(&self.json_payload()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Markdown text when present and non-empty.
    pub fn markdown(&self) -> Option<&str> {
        self.markdown.as_deref().filter(|m| !m.is_empty())
    }

    /// `storage_expiry` as display text; empty when absent or `null`.
    pub fn expiry(&self) -> String {
        match &self.storage_expiry {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}
