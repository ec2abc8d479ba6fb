//! Tab rendering for result cards.
//!
//! Markdown coming back from the service is untrusted: it may embed raw HTML
//! copied out of the source document. The rendered view therefore goes
//! Markdown → HTML (pulldown-cmark) → sanitised HTML (ammonia) before anyone
//! gets to inject it into a page.

use crate::output::ParseResult;
use pulldown_cmark::{html, Options, Parser};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shown in the text tab when a result has no Markdown.
pub const NO_MARKDOWN: &str = "No markdown available.";

/// View mode of one result card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    /// Markdown rendered to sanitised HTML. (default)
    #[default]
    Render,
    /// Raw Markdown text.
    Markdown,
    /// Pretty-printed JSON payload.
    Json,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Render, Tab::Markdown, Tab::Json];

    pub fn as_str(self) -> &'static str {
        match self {
            Tab::Render => "render",
            Tab::Markdown => "markdown",
            Tab::Json => "json",
        }
    }

    /// Button label.
    pub fn label(self) -> &'static str {
        match self {
            Tab::Render => "Markdown (rendered)",
            Tab::Markdown => "Markdown (text)",
            Tab::Json => "JSON",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tab::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown tab {s:?} (expected render, markdown or json)"))
    }
}

/// Content of the active tab, tagged with how a front end should display it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabContent {
    /// Sanitised HTML, safe to inject as markup.
    Html(String),
    /// Preformatted Markdown source.
    Text(String),
    /// Preformatted, pretty-printed JSON.
    Json(String),
}

impl TabContent {
    pub fn as_str(&self) -> &str {
        match self {
            TabContent::Html(s) | TabContent::Text(s) | TabContent::Json(s) => s,
        }
    }
}

/// CommonMark + GFM tables/strikethrough/task lists → sanitised HTML.
pub fn markdown_to_safe_html(markdown: &str) -> String {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);
    opts.insert(Options::ENABLE_FOOTNOTES);

    let parser = Parser::new_ext(markdown, opts);
    let mut unsafe_html = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut unsafe_html, parser);

    ammonia::clean(&unsafe_html)
}

/// Render `tab` for `result`. Pure: never touches the result.
pub fn render_tab(result: &ParseResult, tab: Tab) -> TabContent {
    match tab {
        Tab::Render => TabContent::Html(markdown_to_safe_html(result.markdown().unwrap_or(""))),
        Tab::Markdown => TabContent::Text(
            result.markdown().unwrap_or(NO_MARKDOWN).to_string(),
        ),
        Tab::Json => TabContent::Json(result.pretty_json()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ParseResult {
        ParseResult {
            filename: "sample.pdf".into(),
            markdown: Some("# Title".into()),
            content_list_json: Some(json!({"a": 1})),
            storage_expiry: Some("2025-01-01".into()),
            ..Default::default()
        }
    }

    #[test]
    fn heading_renders_to_h1() {
        let html = markdown_to_safe_html("# Title");
        assert!(html.contains("<h1>Title</h1>"), "got: {html}");
    }

    #[test]
    fn tables_are_rendered() {
        let html = markdown_to_safe_html("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"), "got: {html}");
        assert!(html.contains("<td>1</td>"), "got: {html}");
    }

    #[test]
    fn script_and_handlers_are_stripped() {
        let md = "<script>alert(1)</script>\n\n<img src=\"x.png\" onerror=\"alert(2)\">\n\n[x](javascript:alert(3))";
        let html = markdown_to_safe_html(md);
        assert!(!html.contains("<script"), "got: {html}");
        assert!(!html.contains("onerror"), "got: {html}");
        assert!(!html.contains("javascript:"), "got: {html}");
    }

    #[test]
    fn markdown_tab_is_verbatim() {
        let md = "# Title\n\n<b>raw</b>\n";
        let r = ParseResult {
            markdown: Some(md.into()),
            ..Default::default()
        };
        assert_eq!(render_tab(&r, Tab::Markdown), TabContent::Text(md.into()));
    }

    #[test]
    fn markdown_tab_placeholder_when_absent() {
        let r = ParseResult::default();
        assert_eq!(render_tab(&r, Tab::Markdown).as_str(), NO_MARKDOWN);
    }

    #[test]
    fn json_tab_pretty_prints_payload() {
        assert_eq!(
            render_tab(&sample(), Tab::Json),
            TabContent::Json("{\n  \"a\": 1\n}".into())
        );
    }

    #[test]
    fn json_tab_keeps_backend_key_order() {
        let r = ParseResult {
            content_list_json: Some(
                serde_json::from_str(r#"[{"type":"text","text":"Hi","page_idx":0}]"#).unwrap(),
            ),
            ..Default::default()
        };
        assert_eq!(
            render_tab(&r, Tab::Json).as_str(),
            "[\n  {\n    \"type\": \"text\",\n    \"text\": \"Hi\",\n    \"page_idx\": 0\n  }\n]"
        );
    }

    #[test]
    fn rendering_is_repeatable_and_pure() {
        let r = sample();
        let before = r.clone();
        let first = render_tab(&r, Tab::Render);
        let second = render_tab(&r, Tab::Render);
        assert_eq!(first, second);
        assert_eq!(r, before);
    }

    #[test]
    fn tab_parses_case_insensitively() {
        assert_eq!("JSON".parse::<Tab>().unwrap(), Tab::Json);
        assert!("preview".parse::<Tab>().is_err());
        assert_eq!(Tab::default(), Tab::Render);
    }
}
