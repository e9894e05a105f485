//! Error types for facetouch

use thiserror::Error;

/// Errors raised by a key-value persistence backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Reasons an import document is rejected as a whole
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Import document must be a JSON object")]
    NotAnObject,

    #[error("Missing or empty version")]
    MissingVersion,

    #[error("dailyStats must be an array")]
    MissingDailyStats,
}

/// Errors raised while parsing recorded detection frames
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse line {line}: {message}")]
    ParseError { line: usize, message: String },
}
