//! Error types for read-through cache operations

use std::sync::Arc;
use thiserror::Error;

/// Boxed error returned by a [`Fetcher`](crate::Fetcher) compute.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error types for cache lookups.
///
/// Cloneable so that a single failed compute can be delivered to every
/// waiter that joined it.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// The worker function failed; the error is shared by all waiters.
    #[error("compute for key {key:?} failed: {source}")]
    Compute {
        /// Key whose compute failed
        key: String,
        /// The worker's error
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// The compute slot pool was closed (the cache is shutting down).
    #[error("compute slots closed")]
    Closed,
}

/// Result type for cache lookups
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a compute error for `key`.
    pub fn compute(key: impl Into<String>, source: BoxError) -> Self {
        Self::Compute {
            key: key.into(),
            source: Arc::from(source),
        }
    }
}
