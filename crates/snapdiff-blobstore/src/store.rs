//! The object store abstraction

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

/// Attributes of a stored object, read before its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectAttrs {
    /// Object size in bytes.
    pub size: u64,
    /// MD5 of the object content as recorded by the store.
    pub md5: [u8; 16],
}

/// Streamed object content.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// A content-addressed object store.
///
/// Objects are immutable once written (they are named by content hash), so
/// attributes read before a fetch stay valid for its duration.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Read the attributes of `name`.
    async fn attrs(&self, name: &str) -> Result<ObjectAttrs>;

    /// Open a streaming reader over the content of `name`.
    async fn reader(&self, name: &str) -> Result<ByteStream>;

    /// Remove `name`. Deleting an absent object is not an error.
    async fn delete(&self, name: &str) -> Result<()>;
}
