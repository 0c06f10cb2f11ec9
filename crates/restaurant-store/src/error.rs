//! Error types for restaurant-store.

use std::path::PathBuf;

/// Result type for restaurant-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in restaurant-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file was written by a newer build with an unknown schema.
    #[error("Unsupported schema version {found} (this build understands up to {supported})")]
    UnsupportedSchema { found: i32, supported: i32 },

    /// Invalid timestamp.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
