//! Bounded read-through cache with single-flight computes
//!
//! A [`ReadThroughCache`] maps string keys to values and, on a miss,
//! synchronously invokes a caller-supplied [`Fetcher`] to populate the
//! entry. Concurrent lookups of the same key share one compute and all
//! receive its result; a worker ceiling bounds how many computes run at
//! once; resident entries are evicted least-recently-used.
//!
//! # Example
//!
//! ```
//! use async_trait::async_trait;
//! use snapdiff_cache::{BoxError, Fetcher, ReadThroughCache};
//! use std::sync::Arc;
//!
//! struct Doubler;
//!
//! #[async_trait]
//! impl Fetcher<String> for Doubler {
//!     async fn fetch(&self, key: &str) -> Result<String, BoxError> {
//!         Ok(format!("{key}{key}"))
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), snapdiff_cache::Error> {
//! let cache = ReadThroughCache::new("doubles", 128, 4, Arc::new(Doubler));
//! assert_eq!(cache.get("ab").await?, "abab");
//! assert!(cache.contains("ab"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod error;
mod read_through;
mod stats;

pub use error::{BoxError, Error, Result};
pub use read_through::{Fetcher, ReadThroughCache};
pub use stats::CacheStats;
