use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("No extractable text found in the document.")]
    NoExtractableText,

    #[error("Index not found at {}", .0.display())]
    IndexNotFound(PathBuf),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
