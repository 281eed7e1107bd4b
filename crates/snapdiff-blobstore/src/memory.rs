//! In-memory object store for tests and local runs

use crate::error::{Error, Result};
use crate::store::{ByteStream, ObjectAttrs, ObjectStore};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream;
use md5::{Digest as _, Md5};
use parking_lot::RwLock;
use std::collections::HashMap;

const CHUNK_SIZE: usize = 4096;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    md5: [u8; 16],
}

/// Object store held entirely in memory.
///
/// Counts `reader` calls per object so tests can assert how often content
/// was actually fetched (e.g. at most once under single-flight load), and
/// allows planting a wrong MD5 to simulate corruption.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, StoredObject>>,
    reads: RwLock<HashMap<String, u64>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` under `name` with its true MD5.
    pub fn insert(&self, name: impl Into<String>, data: impl Into<Bytes>) {
        let data = data.into();
        let md5: [u8; 16] = Md5::digest(&data).into();
        self.objects
            .write()
            .insert(name.into(), StoredObject { data, md5 });
    }

    /// Store `data` under `name` with an explicit (possibly wrong) MD5
    /// attribute, simulating in-flight corruption.
    pub fn insert_with_md5(&self, name: impl Into<String>, data: impl Into<Bytes>, md5: [u8; 16]) {
        self.objects.write().insert(
            name.into(),
            StoredObject {
                data: data.into(),
                md5,
            },
        );
    }

    /// Whether `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.objects.read().contains_key(name)
    }

    /// How many times `name`'s content was opened for reading.
    pub fn reads(&self, name: &str) -> u64 {
        self.reads.read().get(name).copied().unwrap_or(0)
    }

    /// Total content reads across all objects.
    pub fn total_reads(&self) -> u64 {
        self.reads.read().values().sum()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn attrs(&self, name: &str) -> Result<ObjectAttrs> {
        let objects = self.objects.read();
        let object = objects.get(name).ok_or_else(|| Error::not_found(name))?;
        Ok(ObjectAttrs {
            size: object.data.len() as u64,
            md5: object.md5,
        })
    }

    async fn reader(&self, name: &str) -> Result<ByteStream> {
        let object = {
            let objects = self.objects.read();
            objects
                .get(name)
                .cloned()
                .ok_or_else(|| Error::not_found(name))?
        };
        *self.reads.write().entry(name.to_owned()).or_insert(0) += 1;

        let chunks: Vec<Result<Bytes>> = object
            .data
            .chunks(CHUNK_SIZE)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();
        Ok(stream::iter(chunks).boxed())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.objects.write().remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::TryStreamExt;

    #[tokio::test]
    async fn test_attrs_reflect_content() {
        let store = MemoryObjectStore::new();
        store.insert("a", &b"hello"[..]);

        let attrs = store.attrs("a").await.unwrap();
        assert_eq!(attrs.size, 5);
        assert_eq!(attrs.md5, <[u8; 16]>::from(Md5::digest(b"hello")));
    }

    #[tokio::test]
    async fn test_reader_streams_content_and_counts() {
        let store = MemoryObjectStore::new();
        let data: Vec<u8> = (0..10_000u32).map(|i| i as u8).collect();
        store.insert("a", data.clone());

        let stream = store.reader("a").await.unwrap();
        let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
        let joined: Vec<u8> = chunks.concat();
        assert_eq!(joined, data);
        assert_eq!(store.reads("a"), 1);
    }

    #[tokio::test]
    async fn test_missing_object() {
        let store = MemoryObjectStore::new();
        assert!(store.attrs("nope").await.unwrap_err().is_not_found());
        match store.reader("nope").await {
            Ok(_) => panic!("expected not-found error"),
            Err(e) => assert!(e.is_not_found()),
        }
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryObjectStore::new();
        store.insert("a", &b"x"[..]);
        store.delete("a").await.unwrap();
        store.delete("a").await.unwrap();
        assert!(!store.contains("a"));
    }
}
