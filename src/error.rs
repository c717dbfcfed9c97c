use std::path::PathBuf;

use crate::command::CommandKind;

/// Errors raised by the viewer and its plugins
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("no plugin registered the `{0}` command")]
    CommandNotRegistered(CommandKind),

    #[error("no URL provided for download")]
    MissingDownloadUrl,

    #[error("download of {url} failed: {detail}")]
    Download { url: String, detail: String },

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

impl ViewerError {
    pub fn download(url: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Download {
            url: url.into(),
            detail: detail.into(),
        }
    }
}

/// Errors raised while turning a source into pages
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("no reader found for URL: {0}")]
    NoReader(String),

    #[error("page {index} out of range ({count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    #[error("failed to read {path:?}: {detail}")]
    Decode { path: PathBuf, detail: String },

    #[error("metadata unavailable for {0}")]
    MetadataUnavailable(String),

    #[error("invalid YouTube URL: {0}")]
    InvalidYoutubeUrl(String),

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "pdf")]
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),
}

impl ReaderError {
    pub fn decode(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            detail: detail.into(),
        }
    }
}
