//! Error types for InfraTrack

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraTrackError {
    // Format errors
    #[error("Unsupported file format: .{extension} (supported: {})", supported.join(", "))]
    UnsupportedFormat {
        extension: String,
        supported: Vec<String>,
    },

    #[error("{format} import failed: {message}")]
    FormatError { format: String, message: String },

    #[error("Archive error in {path}: {reason}")]
    Archive { path: String, reason: String },

    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    // Geodesy errors
    #[error("Projection failed for ({x}, {y}): {reason}")]
    Projection { x: f64, y: f64, reason: String },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // Collaborator errors
    #[error("Commentary service unavailable: {0}")]
    CommentaryUnavailable(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl InfraTrackError {
    /// Shorthand for a whole-file failure of a given format
    pub fn format(format: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::FormatError {
            format: format.into(),
            message: message.to_string(),
        }
    }
}

impl From<serde_json::Error> for InfraTrackError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, InfraTrackError>;
