// ABOUTME: Error types for the slidedecks application
// ABOUTME: Provides structured error handling for each stage of the pipeline

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Failed to read file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Failed to fetch remote resource: {0}")]
    FetchError(#[from] reqwest::Error),

    #[error("HTTP error {status} fetching {url}")]
    FetchStatusError { url: String, status: u16 },

    #[error("Unknown presentation: {name}")]
    UnknownPresentation { name: String, available: Vec<String> },

    #[error("Document conversion error: {0}")]
    ConverterError(String),

    #[error("Stylesheet compilation error: {0}")]
    StyleCompileError(String),

    #[error("Headless browser error: {message}")]
    BrowserError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Archive error: {0}")]
    ArchiveError(String),

    #[error("Integrity check failed for {path:?}: expected sha256 {expected}, got {actual}")]
    IntegrityError {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Metadata error: {0}")]
    MetadataError(#[from] serde_json::Error),

    #[error("HTTP server error: {0}")]
    ServerError(String),

    #[error("Input validation error: {0}")]
    ValidationError(String),

    #[error("Path not found: {0}")]
    PathNotFoundError(PathBuf),

    #[error("Timeout error: {0}")]
    TimeoutError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<zip::result::ZipError> for DeckError {
    fn from(err: zip::result::ZipError) -> Self {
        DeckError::ArchiveError(format!("ZIP operation failed: {}", err))
    }
}

impl From<toml::de::Error> for DeckError {
    fn from(err: toml::de::Error) -> Self {
        DeckError::ConfigError(format!("Invalid registry file: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;
