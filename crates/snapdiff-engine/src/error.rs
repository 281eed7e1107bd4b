//! Error types for the diff engine

use thiserror::Error;

/// Error types for engine operations
#[derive(Error, Debug)]
pub enum Error {
    /// A digest or diff id failed validation
    #[error(transparent)]
    Types(#[from] snapdiff_types::Error),

    /// A cache lookup failed
    #[error(transparent)]
    Cache(#[from] snapdiff_cache::Error),

    /// A durable store operation failed
    #[error("store error: {0}")]
    Store(#[from] snapdiff_store::Error),

    /// A blob operation failed
    #[error("blob error: {0}")]
    Blob(#[from] snapdiff_blobstore::Error),

    /// Stored bytes could not be decoded as a PNG
    #[error("PNG decode failed for {digest}: {reason}")]
    Decode {
        /// Digest of the undecodable blob
        digest: String,
        /// Decoder's complaint
        reason: String,
    },

    /// A rendered image could not be encoded
    #[error("PNG encode failed: {0}")]
    Encode(#[from] image::ImageError),

    /// A background (blocking) task died
    #[error("background task failed: {0}")]
    Task(String),

    /// Every requested comparison failed
    #[error("every comparison against {main} failed ({failed} pairs): {source}")]
    AllComparisonsFailed {
        /// The main digest of the request
        main: String,
        /// How many pairs failed
        failed: usize,
        /// The first failure
        #[source]
        source: snapdiff_cache::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a decode error
    pub fn decode(digest: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            digest: digest.into(),
            reason: reason.into(),
        }
    }

    /// Create a background-task error
    pub fn task(reason: impl Into<String>) -> Self {
        Self::Task(reason.into())
    }

    /// Create an all-comparisons-failed error
    pub fn all_failed(main: impl Into<String>, failed: usize, source: snapdiff_cache::Error) -> Self {
        Self::AllComparisonsFailed {
            main: main.into(),
            failed,
            source,
        }
    }
}

/// Error types for server configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The object store URL does not parse
    #[error("invalid object store url: {0}")]
    StoreUrl(String),

    /// The URL prefix is unusable for route nesting
    #[error("invalid url prefix {0:?}: must start with '/' and not be bare")]
    UrlPrefix(String),

    /// The cache memory budget is zero
    #[error("memory budget must be at least 1 GB")]
    MemoryBudget,
}
