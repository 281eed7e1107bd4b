//! Error types for the snapdiff data model

use thiserror::Error;

/// Error types for digest and diff-id validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Digest is not 32 lowercase hex characters
    #[error("invalid digest {digest:?}: expected 32 lowercase hex characters")]
    InvalidDigest {
        /// The rejected input
        digest: String,
    },

    /// Diff id is not two digests joined by a dash
    #[error("invalid diff id {id:?}: expected <digest>-<digest>")]
    InvalidDiffId {
        /// The rejected input
        id: String,
    },

    /// Both halves of a diff id name the same digest
    #[error("self-comparison for digest {digest}")]
    SelfComparison {
        /// The digest that appeared on both sides
        digest: String,
    },
}

/// Result type for data-model operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid digest error
    pub fn invalid_digest(digest: impl Into<String>) -> Self {
        Self::InvalidDigest {
            digest: digest.into(),
        }
    }

    /// Create an invalid diff id error
    pub fn invalid_diff_id(id: impl Into<String>) -> Self {
        Self::InvalidDiffId { id: id.into() }
    }

    /// Create a self-comparison error
    pub fn self_comparison(digest: impl Into<String>) -> Self {
        Self::SelfComparison {
            digest: digest.into(),
        }
    }
}
