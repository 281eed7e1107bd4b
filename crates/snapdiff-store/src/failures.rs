//! Durable set of unavailable digests

use crate::error::{Error, Result};
use crate::fs::write_atomic;
use parking_lot::RwLock;
use snapdiff_types::{Digest, DigestFailure};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

const FAILURES_FILE: &str = "failures.json";

/// Persistent set of [`DigestFailure`] records, one per digest.
///
/// The full set is small, so it lives in one JSON file with an in-memory
/// snapshot that is refreshed on every mutation; reads never touch disk.
#[derive(Debug)]
pub struct FailureStore {
    path: PathBuf,
    snapshot: RwLock<HashMap<Digest, DigestFailure>>,
    /// Serializes file rewrites so concurrent mutations cannot interleave
    /// a stale snapshot over a newer one.
    persist_lock: tokio::sync::Mutex<()>,
}

impl FailureStore {
    /// Open (creating if needed) the failure store inside `dir`.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::io(&dir, e))?;
        let path = dir.join(FAILURES_FILE);
        let snapshot = match tokio::fs::read(&path).await {
            Ok(data) => {
                let records: Vec<DigestFailure> = serde_json::from_slice(&data)?;
                records
                    .into_iter()
                    .map(|f| (f.digest.clone(), f))
                    .collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(Error::io(&path, e)),
        };
        debug!(path = %path.display(), count = snapshot.len(), "opened failure store");
        Ok(Self {
            path,
            snapshot: RwLock::new(snapshot),
            persist_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Snapshot of all recorded failures.
    pub fn unavailable(&self) -> HashMap<Digest, DigestFailure> {
        self.snapshot.read().clone()
    }

    /// Whether a failure is recorded for `digest`.
    pub fn contains(&self, digest: &Digest) -> bool {
        self.snapshot.read().contains_key(digest)
    }

    /// Insert `failure`, or replace an existing record if the new one is
    /// strictly newer. An older or equal timestamp is a no-op.
    pub async fn add_or_update(&self, failure: DigestFailure) -> Result<()> {
        {
            let mut snapshot = self.snapshot.write();
            if let Some(existing) = snapshot.get(&failure.digest) {
                if existing.ts_millis >= failure.ts_millis {
                    return Ok(());
                }
            }
            snapshot.insert(failure.digest.clone(), failure);
        }
        self.persist().await
    }

    /// Remove the listed digests from the set.
    pub async fn purge(&self, digests: &[Digest]) -> Result<()> {
        let changed = {
            let mut snapshot = self.snapshot.write();
            let before = snapshot.len();
            for digest in digests {
                snapshot.remove(digest);
            }
            snapshot.len() != before
        };
        if changed {
            self.persist().await?;
        }
        Ok(())
    }

    async fn persist(&self) -> Result<()> {
        let _guard = self.persist_lock.lock().await;
        let mut records: Vec<DigestFailure> = self.snapshot.read().values().cloned().collect();
        records.sort_by(|a, b| a.digest.cmp(&b.digest));
        let data = serde_json::to_vec_pretty(&records)?;
        write_atomic(&self.path, &data).await
    }
}
