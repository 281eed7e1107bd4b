//! The diff engine: cache composition and the public operations

use crate::decode::encode_png_fast;
use crate::diff::render_diff;
use crate::error::{Error, Result};
use crate::workers::{BlobWorker, DecodeWorker, MetricsWorker};
use bytes::Bytes;
use image::RgbaImage;
use snapdiff_blobstore::BlobFetcher;
use snapdiff_cache::{CacheStats, ReadThroughCache};
use snapdiff_store::{FailureStore, MetricsStore};
use snapdiff_types::{Digest, DiffId, DiffMetrics, DigestFailure};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Approximate in-memory footprint of one metric record.
const METRIC_RECORD_BYTES: u64 = 100;
/// Approximate size of one encoded PNG.
const ENCODED_IMAGE_BYTES: u64 = 1_000_000;
/// Approximate size of one decoded RGBA buffer.
const DECODED_IMAGE_BYTES: u64 = 4_000_000;
/// Metric records cached per image slot.
const METRICS_PER_IMAGE: u64 = 100;

/// Metric computes mostly hit the durable store and return quickly, so the
/// ceiling is generous.
const DEFAULT_METRICS_WORKERS: usize = 5000;
/// Blob fetches are network-bound.
const DEFAULT_BLOB_WORKERS: usize = 10;

/// Tuning knobs for a [`DiffEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Memory budget for the in-process caches, in gigabytes.
    pub memory_gb: u64,
    /// Concurrent decode computes; decoding and diffing are CPU-heavy.
    pub decode_workers: usize,
    /// Concurrent metric computes.
    pub metrics_workers: usize,
    /// Concurrent blob fetches.
    pub blob_workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            memory_gb: 4,
            decode_workers: std::thread::available_parallelism().map_or(4, |n| n.get()),
            metrics_workers: DEFAULT_METRICS_WORKERS,
            blob_workers: DEFAULT_BLOB_WORKERS,
        }
    }
}

impl EngineConfig {
    /// Derive `(image cache entries, metric cache entries)` from the
    /// memory budget: each image slot pays for one encoded PNG, one
    /// decoded buffer, and its share of metric records.
    fn cache_capacities(&self) -> (usize, usize) {
        let per_slot =
            METRICS_PER_IMAGE * METRIC_RECORD_BYTES + ENCODED_IMAGE_BYTES + DECODED_IMAGE_BYTES;
        let images = ((self.memory_gb << 30) / per_slot).max(1) as usize;
        let metrics = images.saturating_mul(METRICS_PER_IMAGE as usize);
        (images, metrics)
    }
}

/// Counter snapshots for the engine's three caches.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineCacheStats {
    /// Encoded-image cache counters.
    pub encoded: CacheStats,
    /// Decoded-image cache counters.
    pub decoded: CacheStats,
    /// Diff-metrics cache counters.
    pub metrics: CacheStats,
}

/// Computes and caches pairwise image difference metrics on demand.
///
/// One engine owns its caches; requests from any number of tasks may
/// share it concurrently. There is no global lock: each cache serializes
/// per-key computes through its single-flight table and everything else
/// proceeds in parallel.
pub struct DiffEngine {
    encoded: ReadThroughCache<Bytes>,
    decoded: ReadThroughCache<Arc<RgbaImage>>,
    metrics: ReadThroughCache<DiffMetrics>,
    metrics_store: Arc<MetricsStore>,
    failure_store: Arc<FailureStore>,
    blobs: Arc<BlobFetcher>,
}

impl DiffEngine {
    /// Assemble an engine from its collaborators.
    pub fn new(
        config: &EngineConfig,
        blobs: Arc<BlobFetcher>,
        metrics_store: Arc<MetricsStore>,
        failure_store: Arc<FailureStore>,
    ) -> Self {
        let (image_capacity, metric_capacity) = config.cache_capacities();

        let encoded = ReadThroughCache::new(
            "encoded-images",
            image_capacity,
            config.blob_workers,
            Arc::new(BlobWorker {
                fetcher: blobs.clone(),
            }),
        );
        let decoded = ReadThroughCache::new(
            "decoded-images",
            image_capacity,
            config.decode_workers,
            Arc::new(DecodeWorker {
                encoded: encoded.clone(),
                failures: failure_store.clone(),
            }),
        );
        let metrics = ReadThroughCache::new(
            "diff-metrics",
            metric_capacity,
            config.metrics_workers,
            Arc::new(MetricsWorker {
                decoded: decoded.clone(),
                store: metrics_store.clone(),
            }),
        );

        info!(image_capacity, metric_capacity, "diff engine ready");
        Self {
            encoded,
            decoded,
            metrics,
            metrics_store,
            failure_store,
            blobs,
        }
    }

    /// Diff `main` against each digest in `rights`.
    ///
    /// Self-comparisons are silently dropped. Pairs that fail are logged
    /// and omitted from the result; the call errors only when every pair
    /// failed.
    pub async fn get(
        &self,
        main: &Digest,
        rights: &[Digest],
    ) -> Result<HashMap<Digest, DiffMetrics>> {
        let mut pairs = Vec::with_capacity(rights.len());
        for right in rights {
            if right == main {
                continue;
            }
            pairs.push((right.clone(), DiffId::new(main, right)?));
        }
        if pairs.is_empty() {
            return Ok(HashMap::new());
        }

        let keys: Vec<String> = pairs.iter().map(|(_, id)| id.to_string()).collect();
        debug!(%main, pairs = keys.len(), "resolving diff batch");
        let results = self.metrics.get_all(&keys).await;

        let mut resolved = HashMap::with_capacity(pairs.len());
        let mut failed = 0usize;
        let mut first_error = None;
        for ((right, id), result) in pairs.into_iter().zip(results) {
            match result {
                Ok(metrics) => {
                    resolved.insert(right, metrics);
                }
                Err(e) => {
                    warn!(%id, error = %e, "diff computation failed");
                    failed += 1;
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if resolved.is_empty()
            && let Some(source) = first_error
        {
            return Err(Error::all_failed(main.as_str(), failed, source));
        }
        Ok(resolved)
    }

    /// Digests that are currently known to be unavailable.
    pub fn unavailable_digests(&self) -> HashMap<Digest, DigestFailure> {
        self.failure_store.unavailable()
    }

    /// Drop every trace of the listed digests: in-memory cache entries,
    /// persisted metrics, failure records, and (optionally) the stored
    /// blobs themselves.
    pub async fn purge_digests(&self, digests: &[Digest], also_purge_blobs: bool) -> Result<()> {
        for digest in digests {
            let key = [digest.to_string()];
            self.encoded.remove(&key);
            self.decoded.remove(&key);
            if also_purge_blobs {
                self.blobs.delete(digest).await?;
            }
        }

        let stale: Vec<String> = self
            .metrics
            .keys()
            .into_iter()
            .filter(|key| {
                key.parse::<DiffId>()
                    .is_ok_and(|id| digests.iter().any(|d| id.contains(d)))
            })
            .collect();
        self.metrics.remove(&stale);

        self.metrics_store.purge(digests).await?;
        self.failure_store.purge(digests).await?;
        info!(
            count = digests.len(),
            stale_metric_keys = stale.len(),
            "digests purged"
        );
        Ok(())
    }

    /// Original PNG bytes for `digest`.
    pub async fn image_png(&self, digest: &Digest) -> Result<Bytes> {
        Ok(self.encoded.get(digest.as_str()).await?)
    }

    /// Freshly rendered diff visualization for `id`, as PNG bytes.
    pub async fn diff_png(&self, id: &DiffId) -> Result<Vec<u8>> {
        let keys = vec![id.left().to_string(), id.right().to_string()];
        let mut results = self.decoded.get_all(&keys).await.into_iter();
        let (Some(left), Some(right)) = (results.next(), results.next()) else {
            return Err(Error::task("decoded image batch came back short"));
        };
        let (left, right) = (left?, right?);

        tokio::task::spawn_blocking(move || {
            let rendered = render_diff(&left, &right);
            encode_png_fast(&rendered)
        })
        .await
        .map_err(|e| Error::task(e.to_string()))?
    }

    /// Counter snapshots for the three caches.
    pub fn stats(&self) -> EngineCacheStats {
        EngineCacheStats {
            encoded: self.encoded.stats(),
            decoded: self.decoded.stats(),
            metrics: self.metrics.stats(),
        }
    }
}

impl std::fmt::Debug for DiffEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffEngine").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_capacities_follow_budget() {
        let config = EngineConfig {
            memory_gb: 4,
            ..EngineConfig::default()
        };
        let (images, metrics) = config.cache_capacities();
        // 4 GiB / (100*100 + 1e6 + 4e6) bytes per slot.
        assert_eq!(images, (4u64 << 30) as usize / 5_010_000);
        assert_eq!(metrics, images * 100);
    }

    #[test]
    fn test_cache_capacities_never_zero() {
        let config = EngineConfig {
            memory_gb: 0,
            ..EngineConfig::default()
        };
        let (images, metrics) = config.cache_capacities();
        assert_eq!(images, 1);
        assert_eq!(metrics, 100);
    }
}
