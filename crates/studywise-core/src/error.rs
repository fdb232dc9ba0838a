//! Core error types for studywise-core.
//!
//! Each subsystem owns a focused error enum; [`CoreError`] wraps them for
//! callers that just want to propagate with `?`.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for studywise-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Text extraction errors
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// Generative content service errors
    #[error("Generative service error: {0}")]
    Generative(#[from] GenerativeError),

    /// The timer driver task is no longer running
    #[error("Timer driver has stopped")]
    DriverStopped,

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Remote session log request failed
    #[error("Remote session log error: {0}")]
    Remote(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Failures while turning an uploaded document into plain text.
///
/// `UnsupportedType` and `Empty` are input errors; `Pdf` and `Docx` wrap
/// failures of the underlying parsers. All of them are the caller's fault
/// from the HTTP layer's point of view.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unsupported file type: {0}. Only .txt, .pdf, and .docx are currently recognized for processing.")]
    UnsupportedType(String),

    #[error("Failed to extract text from PDF: {0}")]
    Pdf(String),

    #[error("Failed to extract text from DOCX: {0}")]
    Docx(String),

    #[error("No usable text could be extracted from the uploaded file.")]
    Empty,

    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),
}

/// Generative content service errors.
#[derive(Error, Debug)]
pub enum GenerativeError {
    /// No API key in the environment or the keyring
    #[error("Gemini API Key missing.")]
    MissingCredential,

    /// Key can't be sent as an HTTP header value
    #[error("Gemini API Key contains characters that are not valid in a header.")]
    InvalidCredential,

    /// Transport-level failure talking to the service
    #[error("Request to generative service failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Endpoint URL could not be built from configuration
    #[error("Invalid generative service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if matches!(
                    e.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                DatabaseError::Locked
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}
