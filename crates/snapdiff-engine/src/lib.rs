//! Pairwise image diff engine
//!
//! The engine answers "how different are these two PNGs" for a large
//! population of content-addressed images. A request names one main digest
//! and a list of right digests; for every pair the engine returns a
//! [`DiffMetrics`](snapdiff_types::DiffMetrics) record, computed at most
//! once and then served from a three-tier cache:
//!
//! 1. encoded PNG bytes, read-through to the object store,
//! 2. decoded RGBA buffers, read-through to the PNG decoder,
//! 3. diff metrics, read-through to the durable metrics store and, on a
//!    true miss, the diff algorithm.
//!
//! The same decoded tier feeds the HTTP surface, which serves original
//! PNGs and freshly rendered diff visualizations.
//!
//! # Example
//!
//! ```no_run
//! use snapdiff_blobstore::{BlobFetcher, MemoryObjectStore};
//! use snapdiff_engine::{DiffEngine, EngineConfig};
//! use snapdiff_store::{FailureStore, MetricsStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let objects = Arc::new(MemoryObjectStore::new());
//! let failures = Arc::new(FailureStore::open("./state").await?);
//! let metrics = Arc::new(MetricsStore::open("./state/metrics").await?);
//! let blobs = Arc::new(BlobFetcher::new(objects, failures.clone(), "images"));
//!
//! let engine = DiffEngine::new(&EngineConfig::default(), blobs, metrics, failures);
//! let main = "0123456789abcdef0123456789abcdef".parse()?;
//! let right = "fedcba9876543210fedcba9876543210".parse()?;
//! let diffs = engine.get(&main, &[right]).await?;
//! println!("{} comparisons resolved", diffs.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod decode;
mod diff;
mod engine;
mod error;
mod http;
mod server;
mod workers;

pub use config::ServerConfig;
pub use decode::{decode_png, encode_png_fast};
pub use diff::{combined_metric, diff_metrics, render_diff};
pub use engine::{DiffEngine, EngineCacheStats, EngineConfig};
pub use error::{ConfigError, Error, Result};
pub use http::image_routes;
pub use server::Server;
