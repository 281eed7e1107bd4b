//! Failure records for digests that could not be served

use crate::digest::Digest;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Why a digest could not be fetched or decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureReason {
    /// The blob could not be retrieved from the object store.
    Http,
    /// The blob was retrieved but could not be used (e.g. decode failure).
    Other,
}

/// A recorded failure for one digest.
///
/// At most one record exists per digest; a newer record (larger timestamp)
/// replaces an older one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestFailure {
    /// The digest that failed.
    pub digest: Digest,
    /// Failure classification.
    pub reason: FailureReason,
    /// When the failure happened, in Unix milliseconds.
    pub ts_millis: u64,
}

impl DigestFailure {
    /// A failure record stamped with the current time.
    pub fn new(digest: Digest, reason: FailureReason) -> Self {
        Self::at(digest, reason, now_millis())
    }

    /// A failure record with an explicit timestamp.
    pub fn at(digest: Digest, reason: FailureReason, ts_millis: u64) -> Self {
        Self {
            digest,
            reason,
            ts_millis,
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
