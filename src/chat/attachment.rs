// ABOUTME: File attachments sent alongside a prompt.
// ABOUTME: Loads the bytes, guesses the mime type, and checks the backend's accepted extensions.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Extensions the backend accepts; anything else is silently dropped server-side.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "pdf", "mp3", "wav", "txt"];

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("unsupported file type: {0} (accepted: png, jpg, jpeg, pdf, mp3, wav, txt)")]
    Unsupported(String),
    #[error("path has no file name: {}", .0.display())]
    NoFileName(PathBuf),
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A file to upload with the next prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// Build an attachment from in-memory bytes, guessing the mime type.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = guess_mime(&file_name);
        Self {
            file_name,
            mime,
            bytes,
        }
    }

    /// Read a file from disk, refusing types the backend would ignore.
    pub async fn load(path: &Path) -> Result<Self, AttachmentError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| AttachmentError::NoFileName(path.to_path_buf()))?;
        if !is_allowed(&file_name) {
            return Err(AttachmentError::Unsupported(file_name));
        }
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| AttachmentError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(file_name, bytes))
    }
}

fn extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// Whether the backend accepts a file with this name.
pub fn is_allowed(file_name: &str) -> bool {
    extension(file_name).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// Mime type from the file extension; `application/octet-stream` when unknown.
pub fn guess_mime(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
