//! Fetch protocol tests over the in-memory store: verification, retries,
//! failure recording, and failure clearing.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use snapdiff_blobstore::{BlobFetcher, Error, MAX_TRIES, MemoryObjectStore};
use snapdiff_store::FailureStore;
use snapdiff_types::{Digest, DigestFailure, FailureReason};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct Fixture {
    store: Arc<MemoryObjectStore>,
    failures: Arc<FailureStore>,
    fetcher: BlobFetcher,
    _state: TempDir,
}

async fn fixture() -> Fixture {
    let state = TempDir::new().unwrap();
    let store = Arc::new(MemoryObjectStore::new());
    let failures = Arc::new(FailureStore::open(state.path()).await.unwrap());
    let fetcher = BlobFetcher::new(store.clone(), failures.clone(), "images")
        .with_retry_delay(Duration::from_millis(1));
    Fixture {
        store,
        failures,
        fetcher,
        _state: state,
    }
}

fn png_bytes(seed: u8) -> Vec<u8> {
    (0..2048u32).map(|i| (i as u8).wrapping_add(seed)).collect()
}

#[tokio::test]
async fn test_fetch_success_verifies_md5() {
    let f = fixture().await;
    let data = png_bytes(7);
    let digest = Digest::of_bytes(&data);
    f.store
        .insert(f.fetcher.object_name(&digest), data.clone());

    let fetched = f.fetcher.fetch(&digest).await.unwrap();
    assert_eq!(fetched.as_ref(), data.as_slice());
    assert_eq!(f.store.reads(&f.fetcher.object_name(&digest)), 1);
    assert!(f.failures.unavailable().is_empty());
}

#[tokio::test]
async fn test_object_name_layout() {
    let f = fixture().await;
    let digest = Digest::of_bytes(b"x");
    assert_eq!(
        f.fetcher.object_name(&digest),
        format!("images/{digest}.png")
    );
}

#[tokio::test]
async fn test_corrupted_content_retries_then_gives_up() {
    let f = fixture().await;
    let data = png_bytes(1);
    let digest = Digest::of_bytes(&data);
    let name = f.fetcher.object_name(&digest);
    // Plant an MD5 attribute that the content will never hash to.
    f.store.insert_with_md5(&name, data, [0xab; 16]);

    let err = f.fetcher.fetch(&digest).await.unwrap_err();
    match err {
        Error::Exhausted {
            attempts, source, ..
        } => {
            assert_eq!(attempts, MAX_TRIES);
            assert!(matches!(*source, Error::DigestMismatch { .. }));
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
    // One read per attempt.
    assert_eq!(f.store.reads(&name), u64::from(MAX_TRIES));

    // The persistent failure was recorded as an HTTP failure.
    let failures = f.failures.unavailable();
    let failure = failures.get(&digest).expect("failure should be recorded");
    assert_eq!(failure.reason, FailureReason::Http);
}

#[tokio::test]
async fn test_missing_object_records_failure() {
    let f = fixture().await;
    let digest = Digest::of_bytes(b"never uploaded");

    let err = f.fetcher.fetch(&digest).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(f.failures.contains(&digest));
}

#[tokio::test]
async fn test_successful_fetch_clears_stale_failure() {
    let f = fixture().await;
    let data = png_bytes(3);
    let digest = Digest::of_bytes(&data);
    f.failures
        .add_or_update(DigestFailure::at(digest.clone(), FailureReason::Http, 1))
        .await
        .unwrap();

    f.store.insert(f.fetcher.object_name(&digest), data);
    f.fetcher.fetch(&digest).await.unwrap();

    assert!(!f.failures.contains(&digest));
}

#[tokio::test]
async fn test_delete_tolerates_absent_object() {
    let f = fixture().await;
    let digest = Digest::of_bytes(b"gone");
    f.fetcher.delete(&digest).await.unwrap();
}

#[tokio::test]
async fn test_delete_removes_object() {
    let f = fixture().await;
    let data = png_bytes(9);
    let digest = Digest::of_bytes(&data);
    let name = f.fetcher.object_name(&digest);
    f.store.insert(&name, data);

    f.fetcher.delete(&digest).await.unwrap();
    assert!(!f.store.contains(&name));
}
