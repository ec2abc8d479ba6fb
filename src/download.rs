//! Downloadable artifacts for a result set.
//!
//! Each result offers a Markdown file (when Markdown is present) and a JSON
//! file (always). The in-memory [`Download`] is the blob; materialising it
//! gives it a path, the way `URL.createObjectURL` gives a blob an address.
//!
//! A [`DownloadSet`] owns every materialised file for one result set inside a
//! private [`TempDir`]. Dropping the set (on the next submission, or when the
//! view goes away) removes them, so superseded artifacts never pile up.

use crate::error::UploadError;
use crate::output::ParseResult;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

pub const MARKDOWN_MIME: &str = "text/markdown";
pub const JSON_MIME: &str = "application/json";

/// One downloadable blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Suggested file name, e.g. `sample.pdf.md`.
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// The downloads offered on one result card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDownloads {
    pub markdown: Option<Download>,
    pub json: Download,
}

impl CardDownloads {
    pub fn for_result(result: &ParseResult) -> Self {
        let markdown = result.markdown().map(|md| Download {
            file_name: format!("{}.md", result.filename),
            mime_type: MARKDOWN_MIME,
            bytes: md.as_bytes().to_vec(),
        });
        let json = Download {
            file_name: format!("{}.json", result.filename),
            mime_type: JSON_MIME,
            bytes: result.pretty_json().into_bytes(),
        };
        Self { markdown, json }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Download> {
        self.markdown.iter().chain(std::iter::once(&self.json))
    }
}

/// Scoped owner of the artifacts for one result set.
#[derive(Debug, Default)]
pub struct DownloadSet {
    cards: Vec<CardDownloads>,
    materialized: Option<Materialized>,
}

#[derive(Debug)]
struct Materialized {
    dir: TempDir,
    paths: Vec<Vec<PathBuf>>,
}

impl DownloadSet {
    pub fn for_results<'a>(results: impl IntoIterator<Item = &'a ParseResult>) -> Self {
        Self {
            cards: results.into_iter().map(CardDownloads::for_result).collect(),
            materialized: None,
        }
    }

    pub fn card(&self, index: usize) -> Option<&CardDownloads> {
        self.cards.get(index)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Write every artifact into a private temp directory (once) and return
    /// the paths per card. Each card gets its own sub-directory so duplicate
    /// filenames within a batch do not overwrite each other.
    pub fn materialize(&mut self) -> Result<&[Vec<PathBuf>], UploadError> {
        if self.materialized.is_none() {
            let dir = tempfile::Builder::new()
                .prefix("mineru-downloads-")
                .tempdir()
                .map_err(|e| UploadError::Internal(format!("temp dir: {e}")))?;
            let paths = write_cards(&self.cards, dir.path())?;
            debug!("Materialised downloads in {}", dir.path().display());
            self.materialized = Some(Materialized { dir, paths });
        }
        Ok(self
            .materialized
            .as_ref()
            .map(|m| m.paths.as_slice())
            .unwrap_or_default())
    }

    /// Directory holding materialised artifacts, if any.
    pub fn temp_dir(&self) -> Option<&Path> {
        self.materialized.as_ref().map(|m| m.dir.path())
    }

    /// Copy every artifact into `dir` (created if missing) and return the
    /// written paths in card order. Unlike [`Self::materialize`] these files
    /// outlive the set.
    pub fn save_to(&self, dir: &Path) -> Result<Vec<PathBuf>, UploadError> {
        std::fs::create_dir_all(dir).map_err(|source| UploadError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut written = Vec::new();
        for (index, card) in self.cards.iter().enumerate() {
            for download in card.iter() {
                let path = unique_path(dir, &download.file_name, index, &written);
                write_file(&path, &download.bytes)?;
                written.push(path);
            }
        }
        Ok(written)
    }
}

fn write_cards(cards: &[CardDownloads], root: &Path) -> Result<Vec<Vec<PathBuf>>, UploadError> {
    cards
        .iter()
        .enumerate()
        .map(|(index, card)| -> Result<Vec<PathBuf>, UploadError> {
            let card_dir = root.join(index.to_string());
            std::fs::create_dir_all(&card_dir).map_err(|source| {
                UploadError::OutputWriteFailed {
                    path: card_dir.clone(),
                    source,
                }
            })?;
            card.iter()
                .map(|d| -> Result<PathBuf, UploadError> {
                    let path = card_dir.join(sanitize_file_name(&d.file_name));
                    write_file(&path, &d.bytes)?;
                    Ok(path)
                })
                .collect()
        })
        .collect()
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), UploadError> {
    std::fs::write(path, bytes).map_err(|source| UploadError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Keep only the final path component; service-supplied names are untrusted.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match base {
        "" | "." | ".." => "download".to_string(),
        other => other.to_string(),
    }
}

/// `dir/name`, or `dir/{index}-name` if an earlier card already wrote it.
fn unique_path(dir: &Path, name: &str, index: usize, taken: &[PathBuf]) -> PathBuf {
    let name = sanitize_file_name(name);
    let plain = dir.join(&name);
    if taken.contains(&plain) {
        dir.join(format!("{index}-{name}"))
    } else {
        plain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(name: &str, markdown: Option<&str>) -> ParseResult {
        ParseResult {
            filename: name.into(),
            markdown: markdown.map(str::to_string),
            middle_json: Some(json!({"pdf_info": [1]})),
            ..Default::default()
        }
    }

    #[test]
    fn markdown_download_only_when_present() {
        let with = CardDownloads::for_result(&result("a.pdf", Some("# A")));
        assert_eq!(with.markdown.as_ref().unwrap().file_name, "a.pdf.md");
        assert_eq!(with.markdown.as_ref().unwrap().mime_type, MARKDOWN_MIME);

        let without = CardDownloads::for_result(&result("b.pdf", None));
        assert!(without.markdown.is_none());
        assert_eq!(without.json.file_name, "b.pdf.json");
        assert_eq!(without.iter().count(), 1);
    }

    #[test]
    fn json_download_uses_payload_selection() {
        let card = CardDownloads::for_result(&result("a.pdf", None));
        let parsed: serde_json::Value = serde_json::from_slice(&card.json.bytes).unwrap();
        assert_eq!(parsed, json!({"pdf_info": [1]}));

        let empty = CardDownloads::for_result(&ParseResult::default());
        assert_eq!(empty.json.bytes, b"{}");
    }

    #[test]
    fn materialized_files_are_released_on_drop() {
        let results = [result("a.pdf", Some("# A")), result("a.pdf", Some("# B"))];
        let mut set = DownloadSet::for_results(&results);
        let paths = set.materialize().unwrap().to_vec();
        assert_eq!(paths.len(), 2);
        assert_ne!(paths[0][0], paths[1][0], "duplicate names must not collide");
        assert_eq!(std::fs::read_to_string(&paths[1][0]).unwrap(), "# B");

        let dir = set.temp_dir().unwrap().to_path_buf();
        drop(set);
        assert!(!dir.exists());
    }

    #[test]
    fn materialize_is_idempotent() {
        let results = [result("a.pdf", Some("# A"))];
        let mut set = DownloadSet::for_results(&results);
        let first = set.materialize().unwrap().to_vec();
        let second = set.materialize().unwrap().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn save_to_writes_persistent_copies() {
        let out = tempfile::tempdir().unwrap();
        let results = [result("a.pdf", Some("# A")), result("a.pdf", None)];
        let set = DownloadSet::for_results(&results);
        let written = set.save_to(out.path()).unwrap();
        assert_eq!(written.len(), 3);
        assert!(out.path().join("a.pdf.md").exists());
        assert!(out.path().join("a.pdf.json").exists());
        assert!(out.path().join("1-a.pdf.json").exists());
    }

    #[test]
    fn file_names_cannot_escape_directory() {
        assert_eq!(sanitize_file_name("../../etc/passwd.md"), "passwd.md");
        assert_eq!(sanitize_file_name("..\\x.json"), "x.json");
        assert_eq!(sanitize_file_name(".."), "download");
    }
}
