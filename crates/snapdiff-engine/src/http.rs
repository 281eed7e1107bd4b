//! HTTP surface serving original PNGs and rendered diffs

use crate::engine::DiffEngine;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use snapdiff_types::{Digest, DiffId};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Served images are immutable (content-addressed), so clients may cache
/// them for half a day.
const CACHE_HIT: &str = "public, max-age=43200";

/// Misses must not stick in intermediaries.
const CACHE_MISS: &str = "no-cache, no-store, must-revalidate";

/// Build the image routes: `images/{digest}.png` serves the original blob
/// and `diffs/{diffid}.png` serves a freshly rendered diff. The deployment
/// nests this router under its configured URL prefix.
pub fn image_routes(engine: Arc<DiffEngine>) -> Router {
    Router::new()
        .route("/images/{name}", get(serve_image))
        .route("/diffs/{name}", get(serve_diff))
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}

async fn serve_image(
    Path(name): Path<String>,
    State(engine): State<Arc<DiffEngine>>,
) -> Response {
    let Some(digest) = parse_png_name::<Digest>(&name) else {
        debug!(name = %name, "malformed image request");
        return not_found();
    };
    match engine.image_png(&digest).await {
        Ok(bytes) => png_response(bytes.to_vec()),
        Err(e) => {
            debug!(%digest, error = %e, "image not served");
            not_found()
        }
    }
}

async fn serve_diff(Path(name): Path<String>, State(engine): State<Arc<DiffEngine>>) -> Response {
    let Some(id) = parse_png_name::<DiffId>(&name) else {
        debug!(name = %name, "malformed diff request");
        return not_found();
    };
    match engine.diff_png(&id).await {
        Ok(bytes) => png_response(bytes),
        Err(e) => {
            debug!(%id, error = %e, "diff not served");
            not_found()
        }
    }
}

/// Strip the `.png` extension and parse the stem; anything else is a 404.
fn parse_png_name<T: std::str::FromStr>(name: &str) -> Option<T> {
    name.strip_suffix(".png")?.parse().ok()
}

fn png_response(bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, CACHE_HIT),
        ],
        bytes,
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CACHE_CONTROL, CACHE_MISS)],
    )
        .into_response()
}
