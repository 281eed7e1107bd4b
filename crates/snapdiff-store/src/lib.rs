//! Durable state for the snapdiff engine
//!
//! Two small filesystem-backed stores live here:
//!
//! - [`MetricsStore`]: one JSON record per diff id, fanned out under a
//!   two-character prefix directory so a restart-surviving cache of
//!   computed metrics can grow without unbounded directory sizes.
//! - [`FailureStore`]: the set of digests that could not be fetched or
//!   decoded, kept in a single JSON file with an in-memory snapshot (the
//!   set stays small).
//!
//! Both stores commit through a temp-file-and-rename so a crash never
//! leaves a torn record behind.

#![warn(missing_docs)]

mod error;
mod failures;
mod fs;
mod metrics;

pub use error::{Error, Result};
pub use failures::FailureStore;
pub use metrics::MetricsStore;
