//! Worker functions behind the engine's three read-through caches

use crate::decode::decode_png;
use crate::diff::diff_metrics;
use async_trait::async_trait;
use bytes::Bytes;
use image::RgbaImage;
use snapdiff_blobstore::BlobFetcher;
use snapdiff_cache::{BoxError, Fetcher, ReadThroughCache};
use snapdiff_store::{FailureStore, MetricsStore};
use snapdiff_types::{Digest, DiffId, DiffMetrics, DigestFailure, FailureReason};
use std::sync::Arc;
use tracing::{trace, warn};

/// Worker of the encoded-image cache: a thin adapter over the blob
/// fetcher. Persistent failures are recorded by the fetcher itself.
pub(crate) struct BlobWorker {
    pub(crate) fetcher: Arc<BlobFetcher>,
}

#[async_trait]
impl Fetcher<Bytes> for BlobWorker {
    async fn fetch(&self, key: &str) -> std::result::Result<Bytes, BoxError> {
        let digest: Digest = key.parse()?;
        Ok(self.fetcher.fetch(&digest).await?)
    }
}

/// Worker of the decoded-image cache: encoded bytes through the PNG
/// decoder. Decode failures are recorded as non-HTTP digest failures.
pub(crate) struct DecodeWorker {
    pub(crate) encoded: ReadThroughCache<Bytes>,
    pub(crate) failures: Arc<FailureStore>,
}

#[async_trait]
impl Fetcher<Arc<RgbaImage>> for DecodeWorker {
    async fn fetch(&self, key: &str) -> std::result::Result<Arc<RgbaImage>, BoxError> {
        let digest: Digest = key.parse()?;
        let bytes = self.encoded.get(key).await?;
        match decode_png(&digest, bytes).await {
            Ok(image) => Ok(image),
            Err(e) => {
                warn!(%digest, error = %e, "stored image failed to decode");
                let failure = DigestFailure::new(digest.clone(), FailureReason::Other);
                if let Err(store_err) = self.failures.add_or_update(failure).await {
                    warn!(%digest, error = %store_err, "recording decode failure failed");
                }
                Err(e.into())
            }
        }
    }
}

/// Worker of the diff-metrics cache: previously persisted metrics win;
/// otherwise both images are decoded and diffed, and the result is
/// persisted best-effort before being returned.
pub(crate) struct MetricsWorker {
    pub(crate) decoded: ReadThroughCache<Arc<RgbaImage>>,
    pub(crate) store: Arc<MetricsStore>,
}

#[async_trait]
impl Fetcher<DiffMetrics> for MetricsWorker {
    async fn fetch(&self, key: &str) -> std::result::Result<DiffMetrics, BoxError> {
        let id: DiffId = key.parse()?;

        match self.store.load(std::slice::from_ref(&id)).await {
            Ok(loaded) => {
                if let Some(metrics) = loaded.into_iter().flatten().next() {
                    trace!(%id, "metrics served from durable store");
                    return Ok(metrics);
                }
            }
            Err(e) => warn!(%id, error = %e, "metrics store read failed, recomputing"),
        }

        let keys = vec![id.left().to_string(), id.right().to_string()];
        let mut results = self.decoded.get_all(&keys).await.into_iter();
        let (Some(left), Some(right)) = (results.next(), results.next()) else {
            return Err("decoded image batch came back short".into());
        };
        let (left, right) = (left?, right?);

        let metrics = tokio::task::spawn_blocking(move || diff_metrics(&left, &right))
            .await
            .map_err(|e| format!("diff task failed: {e}"))?;

        // The computed value is returned even when persisting it fails.
        if let Err(e) = self.store.save(&id, &metrics).await {
            warn!(%id, error = %e, "persisting metrics failed");
        }
        Ok(metrics)
    }
}
