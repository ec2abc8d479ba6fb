//! Selected files and the selection set.
//!
//! A selection is always replaced wholesale: picking files again, or dropping
//! a new batch, discards whatever was selected before. The limits below are
//! what the form advertises to users; the backend enforces them, not us.

use crate::error::UploadError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions offered by the file picker.
pub const ACCEPTED_EXTENSIONS: &[&str] = &[
    "pdf", "png", "jpg", "jpeg", "jp2", "webp", "gif", "bmp", "doc", "docx",
];

/// Advertised maximum number of files per submission.
pub const MAX_FILES: usize = 5;

/// Advertised maximum size of a single file (50 MiB).
pub const MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// A user-chosen file, fully loaded into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub content: Vec<u8>,
    pub size: u64,
    pub mime_type: String,
}

impl SelectedFile {
    /// Wrap in-memory bytes, inferring the MIME type from `name`.
    pub fn from_bytes(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        let content = content.into();
        let mime_type = mime_for_name(&name).to_string();
        Self {
            size: content.len() as u64,
            name,
            content,
            mime_type,
        }
    }

    /// Read a file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let content = std::fs::read(path).map_err(|e| read_error(path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!("Selected {} ({} bytes)", name, content.len());
        Ok(Self::from_bytes(name, content))
    }

    /// Whether the picker would have offered this file.
    pub fn is_accepted(&self) -> bool {
        is_accepted(&self.name)
    }
}

fn read_error(path: &Path, e: std::io::Error) -> UploadError {
    let path: PathBuf = path.to_path_buf();
    match e.kind() {
        std::io::ErrorKind::NotFound => UploadError::FileNotFound { path },
        std::io::ErrorKind::PermissionDenied => UploadError::PermissionDenied { path },
        _ => UploadError::FileReadFailed { path, source: e },
    }
}

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}

/// Whether `name` has one of the [`ACCEPTED_EXTENSIONS`].
pub fn is_accepted(name: &str) -> bool {
    extension(name).is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
}

/// MIME type for the accepted extensions; `application/octet-stream` otherwise.
pub fn mime_for_name(name: &str) -> &'static str {
    match extension(name).as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("jp2") => "image/jp2",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        _ => "application/octet-stream",
    }
}

/// The current selection. Replaced, never appended to.
#[derive(Debug, Clone, Default)]
pub struct FileSelection {
    files: Vec<SelectedFile>,
}

impl FileSelection {
    /// Discard the current selection and take `files` in its place.
    pub fn replace(&mut self, files: impl IntoIterator<Item = SelectedFile>) {
        self.files = files.into_iter().collect();
    }

    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Files over the advertised size limit. Informational only.
    pub fn oversized(&self) -> impl Iterator<Item = &SelectedFile> {
        self.files.iter().filter(|f| f.size > MAX_FILE_BYTES)
    }

    pub fn exceeds_file_count(&self) -> bool {
        self.files.len() > MAX_FILES
    }
}
