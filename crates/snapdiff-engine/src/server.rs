//! Server assembly and lifecycle

use crate::config::ServerConfig;
use crate::engine::DiffEngine;
use crate::error::Result;
use crate::http::image_routes;
use axum::Router;
use snapdiff_blobstore::{BlobFetcher, HttpObjectStore};
use snapdiff_store::{FailureStore, MetricsStore};
use std::sync::Arc;
use tracing::{error, info};

/// The snapdiff HTTP server: a [`DiffEngine`] wired to a real object store
/// and durable state, serving the image routes under the configured URL
/// prefix until interrupted.
pub struct Server {
    engine: Arc<DiffEngine>,
    config: ServerConfig,
}

impl Server {
    /// Build the engine and its collaborators from configuration.
    pub async fn new(config: ServerConfig) -> Result<Self> {
        info!(state_dir = %config.state_dir.display(), "opening durable stores");
        let failure_store = Arc::new(FailureStore::open(&config.state_dir).await?);
        let metrics_store = Arc::new(MetricsStore::open(config.state_dir.join("metrics")).await?);

        let object_store = Arc::new(HttpObjectStore::new(config.store_base_url())?);
        let blobs = Arc::new(BlobFetcher::new(
            object_store,
            failure_store.clone(),
            config.prefix.clone(),
        ));

        let engine = Arc::new(DiffEngine::new(
            &config.engine_config(),
            blobs,
            metrics_store,
            failure_store,
        ));

        Ok(Self { engine, config })
    }

    /// The engine behind this server, for embedding or inspection.
    #[must_use]
    pub fn engine(&self) -> &Arc<DiffEngine> {
        &self.engine
    }

    /// Serve the image routes until ctrl-c.
    pub async fn run(self) -> Result<()> {
        let app = Router::new().nest(&self.config.url_prefix, image_routes(self.engine.clone()));

        let listener = tokio::net::TcpListener::bind(self.config.http_bind).await?;
        info!(
            "HTTP server listening on {} under {}",
            self.config.http_bind, self.config.url_prefix
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received, stopping server"),
        Err(e) => error!(error = %e, "failed to listen for shutdown signal"),
    }
}
