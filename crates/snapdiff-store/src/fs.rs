//! Filesystem helpers shared by the stores

use crate::error::{Error, Result};
use std::path::Path;

/// Write `data` to `path` through a sibling temp file and rename.
///
/// The rename is the commit point: readers either see the previous record
/// or the complete new one, never a partial write.
pub(crate) async fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, data)
        .await
        .map_err(|e| Error::io(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| Error::io(path, e))?;
    Ok(())
}
