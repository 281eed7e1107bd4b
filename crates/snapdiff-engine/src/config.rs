//! Server configuration management
//!
//! Configuration comes from CLI arguments with environment-variable
//! fallbacks (`SNAPDIFF_*`) and defaults, and is validated before the
//! server starts.
//!
//! # Example
//!
//! ```no_run
//! use snapdiff_engine::ServerConfig;
//!
//! let config = ServerConfig::from_args();
//! config.validate().expect("invalid configuration");
//! println!("serving on {}", config.http_bind);
//! ```

use crate::engine::EngineConfig;
use crate::error::ConfigError;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use url::Url;

/// Server configuration loaded from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "snapdiff-server",
    about = "Image diff engine serving originals and rendered diffs",
    version
)]
pub struct ServerConfig {
    /// HTTP bind address
    #[arg(long, env = "SNAPDIFF_HTTP_BIND", default_value = "0.0.0.0:8080")]
    pub http_bind: SocketAddr,

    /// Base URL of the object store
    #[arg(
        long,
        env = "SNAPDIFF_STORE_URL",
        default_value = "http://127.0.0.1:9000"
    )]
    pub store_url: String,

    /// Bucket holding the image objects
    #[arg(long, env = "SNAPDIFF_BUCKET", default_value = "snapdiff")]
    pub bucket: String,

    /// Object name prefix inside the bucket
    #[arg(long, env = "SNAPDIFF_PREFIX", default_value = "images")]
    pub prefix: String,

    /// Directory for the durable metric and failure stores
    #[arg(long, env = "SNAPDIFF_STATE_DIR", default_value = "./snapdiff-state")]
    pub state_dir: PathBuf,

    /// URL prefix the image routes are nested under
    #[arg(long, env = "SNAPDIFF_URL_PREFIX", default_value = "/img")]
    pub url_prefix: String,

    /// Memory budget for the in-process caches, in gigabytes
    #[arg(long, env = "SNAPDIFF_MEMORY_GB", default_value_t = 4)]
    pub memory_gb: u64,
}

impl ServerConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if Url::parse(&self.store_url).is_err() {
            return Err(ConfigError::StoreUrl(self.store_url.clone()));
        }
        if !self.url_prefix.starts_with('/') || self.url_prefix.len() < 2 {
            return Err(ConfigError::UrlPrefix(self.url_prefix.clone()));
        }
        if self.memory_gb == 0 {
            return Err(ConfigError::MemoryBudget);
        }
        Ok(())
    }

    /// Engine tuning derived from this configuration.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            memory_gb: self.memory_gb,
            ..EngineConfig::default()
        }
    }

    /// Object-store base URL including the bucket.
    #[must_use]
    pub fn store_base_url(&self) -> String {
        format!(
            "{}/{}",
            self.store_url.trim_end_matches('/'),
            self.bucket.trim_matches('/')
        )
    }
}
