//! Error types for the durable stores

use std::path::PathBuf;
use thiserror::Error;

/// Error types for store operations
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem operation failed
    #[error("IO error at {}: {}", path.display(), source)]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A persisted record could not be serialized or parsed
    #[error("serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an IO error tagged with the path involved.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
