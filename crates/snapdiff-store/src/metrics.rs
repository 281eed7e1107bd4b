//! Durable map from diff id to computed metrics

use crate::error::{Error, Result};
use crate::fs::write_atomic;
use snapdiff_types::{Digest, DiffId, DiffMetrics};
use std::path::PathBuf;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Persistent store of computed [`DiffMetrics`], keyed by [`DiffId`].
///
/// Layout: `<root>/<first-two-chars-of-id>/<diff-id>.json`. Entries are
/// written once per diff id and survive restarts, so a recomputation is
/// only ever needed after an explicit purge.
#[derive(Debug)]
pub struct MetricsStore {
    root: PathBuf,
}

impl MetricsStore {
    /// Open (creating if needed) a metrics store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| Error::io(&root, e))?;
        debug!(root = %root.display(), "opened metrics store");
        Ok(Self { root })
    }

    fn entry_path(&self, id: &DiffId) -> PathBuf {
        let text = id.to_string();
        self.root.join(&text[..2]).join(format!("{text}.json"))
    }

    /// Batch read. One slot per requested id, in input order; absent
    /// entries are `None`.
    pub async fn load(&self, ids: &[DiffId]) -> Result<Vec<Option<DiffMetrics>>> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            out.push(self.load_one(id).await?);
        }
        Ok(out)
    }

    async fn load_one(&self, id: &DiffId) -> Result<Option<DiffMetrics>> {
        let path = self.entry_path(id);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io(&path, e)),
        };
        Ok(Some(serde_json::from_slice(&data)?))
    }

    /// Upsert the record for `id`. Visible to `load` as soon as this
    /// returns.
    pub async fn save(&self, id: &DiffId, metrics: &DiffMetrics) -> Result<()> {
        let path = self.entry_path(id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io(parent, e))?;
        }
        let data = serde_json::to_vec(metrics)?;
        write_atomic(&path, &data).await
    }

    /// Delete every record whose id contains any of `digests`.
    ///
    /// Walks the whole tree; the store holds small records and purges are
    /// rare, so a linear scan is fine.
    pub async fn purge(&self, digests: &[Digest]) -> Result<()> {
        let mut doomed = Vec::new();
        for entry in WalkDir::new(&self.root).into_iter().flatten() {
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(stem) = entry.path().file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Ok(id) = stem.parse::<DiffId>() else {
                warn!(path = %entry.path().display(), "skipping unrecognized file in metrics store");
                continue;
            };
            if digests.iter().any(|d| id.contains(d)) {
                doomed.push(entry.path().to_path_buf());
            }
        }
        debug!(count = doomed.len(), "purging metric records");
        for path in doomed {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| Error::io(&path, e))?;
        }
        Ok(())
    }
}
