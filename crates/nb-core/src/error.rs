//! # AppError
//!
//! Centralized error handling for the backup receiver.
//! Maps persistence and request failures to actionable error types.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all nb-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// The board id from the request path disagrees with the `id` inside the payload.
    #[error("board id mismatch: path says {path_id}, payload says {payload_id}")]
    BoardIdMismatch { path_id: i64, payload_id: String },

    /// Client input that cannot be turned into a structured document
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Category names end up as a directory segment, so they are restricted.
    #[error("invalid category name: {0:?}")]
    InvalidCategory(String),

    /// Target directory could not be created. Aborts the remaining writes of a save.
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single target file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Bad value in the process environment or `.env` file
    #[error("configuration error: {0}")]
    Config(String),

    /// Infrastructure failure that fits nowhere else
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for errors caused by what the client sent rather than by the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::BoardIdMismatch { .. }
                | AppError::ValidationError(_)
                | AppError::InvalidCategory(_)
        )
    }
}

/// A specialized Result type for backup logic.
pub type Result<T> = std::result::Result<T, AppError>;
