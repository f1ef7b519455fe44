//! Error types for cask-core
//!
//! One taxonomy for the whole engine: backend adapters translate their SDK
//! errors into these variants, services and the session facade propagate
//! them annotated with operation context.

use thiserror::Error;

use crate::store::DeleteError;

/// Result type alias for cask-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cask-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid key or prefix format
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Connection id unknown to the registry
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Bad or expired credentials
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Key absent on read
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport or timeout failure (retryable)
    #[error("Network error: {0}")]
    Network(String),

    /// Contract violation by the caller, e.g. an oversized delete batch
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Folder deletion attempted without the typed confirmation
    #[error("Confirmation required: {0}")]
    ConfirmationRequired(String),

    /// A bulk deletion completed with per-key failures
    #[error("Partial batch failure: {} object(s) could not be deleted", errors.len())]
    PartialBatchFailure { errors: Vec<DeleteError> },

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Whether the error indicates a missing key or bucket.
    ///
    /// Used where absence is tolerated, e.g. deleting a folder marker that
    /// the backend never materialized.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Whether the error should abort an in-flight traversal rather than be
    /// recorded and skipped.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Auth(_) | Error::Network(_) | Error::InvalidArgument(_)
        )
    }
}
