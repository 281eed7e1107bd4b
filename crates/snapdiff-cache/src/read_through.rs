//! The read-through cache implementation

use crate::error::{BoxError, Error, Result};
use crate::stats::CacheStats;
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Semaphore;
use tracing::{debug, trace};

/// Worker function of a read-through cache.
///
/// Invoked once per missing key; the returned value is published to every
/// caller waiting on that key and retained until evicted or invalidated.
#[async_trait]
pub trait Fetcher<V>: Send + Sync + 'static {
    /// Compute the value for `key`.
    async fn fetch(&self, key: &str) -> std::result::Result<V, BoxError>;
}

/// A shared handle to one in-flight compute. Every waiter polls a clone;
/// the first poll drives the underlying future.
type Computation<V> = Shared<BoxFuture<'static, Result<V>>>;

struct InFlight<V> {
    /// Generation id; a detached compute (see [`ReadThroughCache::remove`])
    /// fails this check and its result is not admitted.
    id: u64,
    computation: Computation<V>,
}

struct State<V> {
    resident: LruCache<String, V>,
    in_flight: HashMap<String, InFlight<V>>,
    flight_seq: u64,
}

struct Inner<V> {
    label: String,
    fetcher: Arc<dyn Fetcher<V>>,
    /// Worker ceiling: computes queue here once the pool is saturated.
    slots: Arc<Semaphore>,
    state: Mutex<State<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
    joins: AtomicU64,
    evictions: AtomicU64,
}

/// Bounded associative cache that computes missing values through a
/// [`Fetcher`], with at most one concurrent compute per key.
///
/// Cloning the cache is cheap and shares all state.
pub struct ReadThroughCache<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for ReadThroughCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> std::fmt::Debug for ReadThroughCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadThroughCache")
            .field("label", &self.inner.label)
            .finish_non_exhaustive()
    }
}

impl<V> ReadThroughCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache holding up to `capacity` resident entries, running at
    /// most `workers` computes concurrently.
    ///
    /// A `capacity` or `workers` of zero is treated as one.
    pub fn new(
        label: impl Into<String>,
        capacity: usize,
        workers: usize,
        fetcher: Arc<dyn Fetcher<V>>,
    ) -> Self {
        let label = label.into();
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        debug!(
            cache = %label,
            capacity = capacity.get(),
            workers = workers.max(1),
            "created read-through cache"
        );
        Self {
            inner: Arc::new(Inner {
                label,
                fetcher,
                slots: Arc::new(Semaphore::new(workers.max(1))),
                state: Mutex::new(State {
                    resident: LruCache::new(capacity),
                    in_flight: HashMap::new(),
                    flight_seq: 0,
                }),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                joins: AtomicU64::new(0),
                evictions: AtomicU64::new(0),
            }),
        }
    }

    /// Return the value for `key`, computing it if absent.
    ///
    /// Concurrent callers for the same key share a single compute and all
    /// receive its result; a failed compute delivers the error to every
    /// waiter and caches nothing.
    pub async fn get(&self, key: &str) -> Result<V> {
        let computation = {
            let mut state = self.inner.state.lock();
            if let Some(value) = state.resident.get(key) {
                self.inner.hits.fetch_add(1, Ordering::Relaxed);
                trace!(cache = %self.inner.label, key, "hit");
                return Ok(value.clone());
            }
            if let Some(flight) = state.in_flight.get(key) {
                self.inner.joins.fetch_add(1, Ordering::Relaxed);
                trace!(cache = %self.inner.label, key, "joined in-flight compute");
                flight.computation.clone()
            } else {
                self.inner.misses.fetch_add(1, Ordering::Relaxed);
                trace!(cache = %self.inner.label, key, "miss, starting compute");
                state.flight_seq += 1;
                let id = state.flight_seq;
                let computation = Self::computation(Arc::clone(&self.inner), key.to_owned(), id);
                state.in_flight.insert(
                    key.to_owned(),
                    InFlight {
                        id,
                        computation: computation.clone(),
                    },
                );
                computation
            }
        };
        computation.await
    }

    /// Batched [`get`](Self::get): one result per key, in input order.
    ///
    /// Computes are issued concurrently but still bounded by the worker
    /// ceiling; keys listed twice share one compute.
    pub async fn get_all(&self, keys: &[String]) -> Vec<Result<V>> {
        futures::future::join_all(keys.iter().map(|key| self.get(key))).await
    }

    /// Whether `key` is resident. Never starts a compute and does not touch
    /// recency.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.state.lock().resident.contains(key)
    }

    /// Invalidate the listed keys.
    ///
    /// Resident values are discarded. An in-flight compute is detached
    /// rather than cancelled: its current waiters still receive the result,
    /// but the value is not admitted, so the next `get` recomputes.
    pub fn remove(&self, keys: &[String]) {
        let mut state = self.inner.state.lock();
        for key in keys {
            state.resident.pop(key);
            if state.in_flight.remove(key).is_some() {
                trace!(cache = %self.inner.label, key = %key, "detached in-flight compute");
            }
        }
    }

    /// Snapshot of the currently resident keys.
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .state
            .lock()
            .resident
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.inner.state.lock().resident.len()
    }

    /// Whether no entries are resident.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counter snapshot.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            joins: self.inner.joins.load(Ordering::Relaxed),
            evictions: self.inner.evictions.load(Ordering::Relaxed),
        }
    }

    /// Build the shared compute for `key`. The future acquires a worker
    /// slot, runs the fetcher, then publishes: on success the value is
    /// admitted to the resident map unless the flight was detached in the
    /// meantime; on failure nothing is cached.
    fn computation(inner: Arc<Inner<V>>, key: String, id: u64) -> Computation<V> {
        async move {
            let permit = match Arc::clone(&inner.slots).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return Err(Error::Closed),
            };
            let result = inner.fetcher.fetch(&key).await;
            drop(permit);

            let mut state = inner.state.lock();
            let current = state.in_flight.get(&key).is_some_and(|f| f.id == id);
            if current {
                state.in_flight.remove(&key);
            }
            match result {
                Ok(value) => {
                    if current {
                        if let Some((evicted, _)) = state.resident.push(key.clone(), value.clone())
                        {
                            if evicted != key {
                                inner.evictions.fetch_add(1, Ordering::Relaxed);
                                trace!(cache = %inner.label, key = %evicted, "evicted");
                            }
                        }
                    }
                    Ok(value)
                }
                Err(source) => {
                    debug!(cache = %inner.label, key = %key, error = %source, "compute failed");
                    Err(Error::compute(key, source))
                }
            }
        }
        .boxed()
        .shared()
    }
}
