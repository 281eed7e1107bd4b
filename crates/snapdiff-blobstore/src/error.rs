//! Error types for object store and blob fetch operations

use thiserror::Error;

/// Error types for blob retrieval
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Object does not exist in the store
    #[error("object not found: {name}")]
    NotFound {
        /// Name of the missing object
        name: String,
    },

    /// Object attributes were missing or unusable
    #[error("invalid attributes for {name}: {reason}")]
    Attrs {
        /// Name of the object
        name: String,
        /// What was wrong with the attributes
        reason: String,
    },

    /// Streamed content did not hash to the store's recorded MD5
    #[error("digest mismatch for {name}: expected {expected}, got {actual}")]
    DigestMismatch {
        /// Name of the object
        name: String,
        /// MD5 from the object attributes, hex
        expected: String,
        /// MD5 of the received bytes, hex
        actual: String,
    },

    /// Streamed content had the wrong length
    #[error("size mismatch for {name}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Name of the object
        name: String,
        /// Size from the object attributes
        expected: u64,
        /// Number of bytes received
        actual: u64,
    },

    /// Object URL could not be constructed
    #[error("invalid object url: {url}")]
    InvalidUrl {
        /// The unusable URL or the reason it could not be built
        url: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Every fetch attempt failed
    #[error("fetch of {digest} gave up after {attempts} attempts: {source}")]
    Exhausted {
        /// Digest being fetched
        digest: String,
        /// Number of attempts made
        attempts: u32,
        /// The last attempt's error
        #[source]
        source: Box<Error>,
    },
}

/// Result type for blob retrieval
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a not-found error
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create an attributes error
    pub fn attrs(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Attrs {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a digest mismatch error
    pub fn digest_mismatch(
        name: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::DigestMismatch {
            name: name.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a size mismatch error
    pub fn size_mismatch(name: impl Into<String>, expected: u64, actual: u64) -> Self {
        Self::SizeMismatch {
            name: name.into(),
            expected,
            actual,
        }
    }

    /// Create an invalid URL error
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Create an exhausted-retries error
    pub fn exhausted(digest: impl Into<String>, attempts: u32, source: Self) -> Self {
        Self::Exhausted {
            digest: digest.into(),
            attempts,
            source: Box::new(source),
        }
    }

    /// Whether this error means the object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
