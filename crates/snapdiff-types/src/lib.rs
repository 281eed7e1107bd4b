//! Shared data model for the snapdiff engine
//!
//! Everything here is plain data: content digests, canonical pair
//! identifiers, computed difference metrics, and failure records. The
//! heavier crates (cache, blobstore, store, engine) all build on these
//! types.
//!
//! # Example
//!
//! ```
//! use snapdiff_types::{Digest, DiffId};
//!
//! # fn main() -> Result<(), snapdiff_types::Error> {
//! let a: Digest = "0123456789abcdef0123456789abcdef".parse()?;
//! let b: Digest = "fedcba9876543210fedcba9876543210".parse()?;
//!
//! // Canonical and symmetric: new(a, b) == new(b, a)
//! let id = DiffId::new(&a, &b)?;
//! assert_eq!(id.to_string().len(), DiffId::LEN);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod digest;
mod diff_id;
mod error;
mod failure;
mod metrics;

pub use diff_id::DiffId;
pub use digest::Digest;
pub use error::{Error, Result};
pub use failure::{DigestFailure, FailureReason};
pub use metrics::DiffMetrics;
