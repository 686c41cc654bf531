use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Please provide at least one of key, node_title, or node_type")]
    MissingSearchCriteria,

    /// The caller named a file explicitly, so nothing found in it is fatal.
    #[error("Filepath provided but no metadata found in file")]
    NoMetadataInFile { path: PathBuf },

    #[error("Raw metadata provided but could not be parsed")]
    UnparsableRawMetadata,

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid pixel buffer: {0}")]
    InvalidPixelBuffer(String),
}

impl Error {
    /// Text form handed back to the host in place of a result.
    pub fn to_output_text(&self) -> String {
        format!("Error: {}", self)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
