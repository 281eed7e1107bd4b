//! Verified, retrying blob fetches

use crate::error::{Error, Result};
use crate::store::{ObjectAttrs, ObjectStore};
use bytes::Bytes;
use futures_util::TryStreamExt;
use md5::{Digest as _, Md5};
use snapdiff_store::FailureStore;
use snapdiff_types::{Digest, DigestFailure, FailureReason};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Maximum fetch attempts per blob.
pub const MAX_TRIES: u32 = 4;

/// Pause between failed attempts.
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Retrieves PNG blobs for digests from an object store.
///
/// The object for digest `d` lives at `<prefix>/<d>.png`. Every fetch is
/// verified end to end: the store is content-addressed, so a hash mismatch
/// means the bytes were corrupted in flight and the attempt is retried.
/// Digests that stay unavailable are recorded in the failure store; a
/// later successful fetch clears the stale record.
pub struct BlobFetcher {
    store: Arc<dyn ObjectStore>,
    failures: Arc<FailureStore>,
    prefix: String,
    retry_delay: Duration,
}

impl BlobFetcher {
    /// Create a fetcher reading objects under `prefix`.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        failures: Arc<FailureStore>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            failures,
            prefix: prefix.into(),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Set the pause between failed attempts.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Object name for `digest`.
    pub fn object_name(&self, digest: &Digest) -> String {
        let prefix = self.prefix.trim_end_matches('/');
        if prefix.is_empty() {
            format!("{digest}.png")
        } else {
            format!("{prefix}/{digest}.png")
        }
    }

    /// Fetch and verify the blob for `digest`.
    pub async fn fetch(&self, digest: &Digest) -> Result<Bytes> {
        let name = self.object_name(digest);
        let attrs = match self.store.attrs(&name).await {
            Ok(attrs) => attrs,
            Err(e) => {
                warn!(%digest, error = %e, "reading object attributes failed");
                self.record_failure(digest).await;
                return Err(e);
            }
        };

        let mut last_error = None;
        for attempt in 1..=MAX_TRIES {
            if attempt > 1 {
                sleep(self.retry_delay).await;
            }
            match self.try_fetch(&name, attrs).await {
                Ok(data) => {
                    debug!(%digest, size = data.len(), attempt, "blob fetched");
                    self.clear_failure(digest).await;
                    return Ok(data);
                }
                Err(e) => {
                    warn!(%digest, attempt, error = %e, "blob fetch attempt failed");
                    last_error = Some(e);
                }
            }
        }

        self.record_failure(digest).await;
        let source = last_error.unwrap_or_else(|| Error::not_found(&name));
        Err(Error::exhausted(digest.as_str(), MAX_TRIES, source))
    }

    /// Best-effort removal of the blob for `digest`.
    pub async fn delete(&self, digest: &Digest) -> Result<()> {
        let name = self.object_name(digest);
        match self.store.delete(&name).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// One streaming attempt: buffer the body while hashing, then check
    /// length and MD5 against the attributes.
    async fn try_fetch(&self, name: &str, attrs: ObjectAttrs) -> Result<Bytes> {
        let mut stream = self.store.reader(name).await?;
        let mut buf = Vec::with_capacity(attrs.size as usize);
        let mut hasher = Md5::new();
        while let Some(chunk) = stream.try_next().await? {
            hasher.update(&chunk);
            buf.extend_from_slice(&chunk);
        }

        if buf.len() as u64 != attrs.size {
            return Err(Error::size_mismatch(name, attrs.size, buf.len() as u64));
        }
        let actual: [u8; 16] = hasher.finalize().into();
        if actual != attrs.md5 {
            return Err(Error::digest_mismatch(
                name,
                hex::encode(attrs.md5),
                hex::encode(actual),
            ));
        }
        Ok(buf.into())
    }

    async fn record_failure(&self, digest: &Digest) {
        let failure = DigestFailure::new(digest.clone(), FailureReason::Http);
        if let Err(e) = self.failures.add_or_update(failure).await {
            warn!(%digest, error = %e, "recording digest failure failed");
        }
    }

    /// The blob is fetchable again, so an earlier failure record is stale.
    async fn clear_failure(&self, digest: &Digest) {
        if !self.failures.contains(digest) {
            return;
        }
        if let Err(e) = self.failures.purge(std::slice::from_ref(digest)).await {
            debug!(%digest, error = %e, "clearing stale digest failure failed");
        }
    }
}

impl std::fmt::Debug for BlobFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobFetcher")
            .field("prefix", &self.prefix)
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}
