//! snapdiff server binary entry point.
//!
//! A thin wrapper around the snapdiff-engine library that:
//! 1. Parses command-line arguments
//! 2. Initializes logging
//! 3. Validates configuration
//! 4. Starts the server
//!
//! For library usage, see the snapdiff-engine crate documentation.

use anyhow::Result;
use snapdiff_engine::{Server, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_args();
    tracing::info!(
        "configuration loaded: bind={}, store={}, state={:?}",
        config.http_bind,
        config.store_base_url(),
        config.state_dir
    );

    config.validate()?;

    let server = Server::new(config).await?;
    server.run().await?;

    Ok(())
}
