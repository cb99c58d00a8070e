//! Error types for fiscus

use thiserror::Error;

/// Convenience result type using the fiscus [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Error type shared across the service modules
#[derive(Error, Debug)]
pub enum Error {
    /// Database connection or query errors
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Payload decode errors (kept apart from store failures so the API
    /// layer can answer 400 instead of 500)
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// File I/O errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Backup archive errors
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Corrupt or unreadable bootstrap sidecar
    #[error("bootstrap error: {0}")]
    Bootstrap(String),

    /// A record was folded into a feature of another category
    #[error("cannot update feature `{feature}` with record from another category `{record}`")]
    FeatureMismatch { feature: String, record: String },
}
