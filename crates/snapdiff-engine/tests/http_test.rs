//! HTTP surface tests: a real listener, real requests, and the cache
//! headers clients depend on.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use axum::Router;
use image::{Rgba, RgbaImage};
use snapdiff_blobstore::{BlobFetcher, MemoryObjectStore};
use snapdiff_engine::{DiffEngine, EngineConfig, encode_png_fast, image_routes};
use snapdiff_store::{FailureStore, MetricsStore};
use snapdiff_types::{Digest, DiffId};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const PREFIX: &str = "images";

fn digest(c: char) -> Digest {
    Digest::new(c.to_string().repeat(32)).unwrap()
}

fn object_name(d: &Digest) -> String {
    format!("{PREFIX}/{d}.png")
}

async fn start_server(state: &TempDir, objects: Arc<MemoryObjectStore>) -> SocketAddr {
    let failures = Arc::new(FailureStore::open(state.path()).await.unwrap());
    let metrics = Arc::new(MetricsStore::open(state.path().join("metrics")).await.unwrap());
    let blobs = Arc::new(
        BlobFetcher::new(objects, failures.clone(), PREFIX)
            .with_retry_delay(Duration::from_millis(1)),
    );
    let engine = Arc::new(DiffEngine::new(
        &EngineConfig::default(),
        blobs,
        metrics,
        failures,
    ));

    let app = Router::new().nest("/img", image_routes(engine));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn cache_control(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get("cache-control")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

#[tokio::test]
async fn test_serves_original_png() {
    let state = TempDir::new().unwrap();
    let objects = Arc::new(MemoryObjectStore::new());
    let a = digest('a');
    let png = encode_png_fast(&RgbaImage::from_pixel(4, 4, Rgba([7, 7, 7, 255]))).unwrap();
    objects.insert(object_name(&a), png.clone());

    let addr = start_server(&state, objects).await;
    let response = reqwest::get(format!("http://{addr}/img/images/{a}.png"))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(cache_control(&response), "public, max-age=43200");
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "image/png"
    );
    assert_eq!(response.bytes().await.unwrap().as_ref(), png.as_slice());
}

#[tokio::test]
async fn test_serves_rendered_diff() {
    let state = TempDir::new().unwrap();
    let objects = Arc::new(MemoryObjectStore::new());
    let a = digest('a');
    let b = digest('b');
    objects.insert(
        object_name(&a),
        encode_png_fast(&RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]))).unwrap(),
    );
    objects.insert(
        object_name(&b),
        encode_png_fast(&RgbaImage::from_pixel(3, 2, Rgba([0, 0, 0, 255]))).unwrap(),
    );

    let addr = start_server(&state, objects).await;
    let id = DiffId::new(&a, &b).unwrap();
    let response = reqwest::get(format!("http://{addr}/img/diffs/{id}.png"))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(cache_control(&response), "public, max-age=43200");

    // The rendered diff covers the larger of the two sizes.
    let body = response.bytes().await.unwrap();
    let rendered = image::load_from_memory(&body).unwrap().into_rgba8();
    assert_eq!(rendered.dimensions(), (3, 2));
}

#[tokio::test]
async fn test_unknown_digest_is_404_with_no_cache() {
    let state = TempDir::new().unwrap();
    let addr = start_server(&state, Arc::new(MemoryObjectStore::new())).await;

    let a = digest('a');
    let response = reqwest::get(format!("http://{addr}/img/images/{a}.png"))
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    assert_eq!(cache_control(&response), "no-cache, no-store, must-revalidate");
}

#[tokio::test]
async fn test_malformed_requests_are_404() {
    let state = TempDir::new().unwrap();
    let addr = start_server(&state, Arc::new(MemoryObjectStore::new())).await;
    let a = digest('a');

    for path in [
        // Not a digest.
        "images/nonsense.png".to_owned(),
        // Wrong extension.
        format!("images/{a}.jpg"),
        // Digest without extension.
        format!("images/{a}"),
        // Invalid diff id.
        "diffs/not-a-diff-id.png".to_owned(),
        // Self pair is not a valid diff id.
        format!("diffs/{a}-{a}.png"),
    ] {
        let response = reqwest::get(format!("http://{addr}/img/{path}")).await.unwrap();
        assert_eq!(response.status(), 404, "path {path} should 404");
        assert_eq!(
            cache_control(&response),
            "no-cache, no-store, must-revalidate",
            "path {path} should carry the no-cache header"
        );
    }
}

#[tokio::test]
async fn test_routes_only_exist_under_prefix() {
    let state = TempDir::new().unwrap();
    let objects = Arc::new(MemoryObjectStore::new());
    let a = digest('a');
    objects.insert(
        object_name(&a),
        encode_png_fast(&RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]))).unwrap(),
    );

    let addr = start_server(&state, objects).await;
    let response = reqwest::get(format!("http://{addr}/images/{a}.png"))
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}
