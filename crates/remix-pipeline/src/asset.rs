/// Local audio files and their remote counterparts
use crate::error::{RemixError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Remote identity of an uploaded file.
///
/// The signed-URL flow hands back an absolute URL; the multipart flow hands
/// back an opaque file id. Both are stable references a job request can use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteAsset {
    Url(String),
    Id(String),
}

impl RemoteAsset {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Url(s) | Self::Id(s) => s,
        }
    }
}

/// A user-selected audio file, optionally already uploaded.
///
/// Once `remote` is set the asset is considered immutable; callers must not
/// re-upload it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedAsset {
    /// Local file path.
    pub path: PathBuf,

    /// Filename sent to the signing endpoint.
    pub filename: String,

    /// MIME type; `application/octet-stream` when unknown.
    pub content_type: String,

    /// File size in bytes.
    pub size_bytes: u64,

    /// Remote reference, set exactly once after a successful upload.
    pub remote: Option<RemoteAsset>,
}

impl UploadedAsset {
    /// Build from a local path, probing size and guessing the content type
    /// from the extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .ok_or_else(|| RemixError::InvalidInput(format!("no filename in {:?}", path)))?;
        if filename.is_empty() {
            return Err(RemixError::InvalidInput("empty filename".to_string()));
        }
        let size_bytes = std::fs::metadata(&path)?.len();
        let content_type = guess_content_type(&path).to_string();

        Ok(Self {
            path,
            filename,
            content_type,
            size_bytes,
            remote: None,
        })
    }

    /// True once a remote reference has been assigned.
    pub fn is_uploaded(&self) -> bool {
        self.remote.is_some()
    }

    /// Read the file bytes for transfer.
    pub async fn read_bytes(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.path).await?)
    }
}

fn guess_content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("flac") => "audio/flac",
        Some("ogg") => "audio/ogg",
        Some("m4a") | Some("aac") => "audio/mp4",
        _ => "application/octet-stream",
    }
}
