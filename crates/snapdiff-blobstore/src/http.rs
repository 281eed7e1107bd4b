//! HTTP implementation of the object store

use crate::error::{Error, Result};
use crate::store::{ByteStream, ObjectAttrs, ObjectStore};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::{Client, StatusCode, header};
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default request timeout
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Default maximum idle connections per host
const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 20;

/// Object store speaking plain HTTP: `HEAD` for attributes, `GET` for
/// content, `DELETE` for removal.
///
/// The store is expected to report the object's MD5 in a `Content-MD5`
/// header (RFC 1864 base64) alongside `Content-Length`.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    client: Client,
    base_url: Url,
}

impl HttpObjectStore {
    /// Create a store with default timeouts rooted at `base_url`.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::builder().base_url(base_url.as_ref()).build()
    }

    /// Create a builder for configuring the store.
    pub fn builder() -> HttpObjectStoreBuilder {
        HttpObjectStoreBuilder::new()
    }

    fn object_url(&self, name: &str) -> Result<Url> {
        self.base_url
            .join(name)
            .map_err(|_| Error::invalid_url(format!("{}{name}", self.base_url)))
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn attrs(&self, name: &str) -> Result<ObjectAttrs> {
        let url = self.object_url(name)?;
        trace!(%url, "HEAD object attributes");
        let response = self.client.head(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::not_found(name));
        }
        let response = response.error_for_status()?;

        let size = response
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| Error::attrs(name, "missing or invalid Content-Length"))?;

        let md5_b64 = response
            .headers()
            .get("content-md5")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::attrs(name, "missing Content-MD5"))?;
        let md5: [u8; 16] = BASE64
            .decode(md5_b64)
            .ok()
            .and_then(|raw| raw.try_into().ok())
            .ok_or_else(|| Error::attrs(name, "Content-MD5 is not a base64 MD5"))?;

        Ok(ObjectAttrs { size, md5 })
    }

    async fn reader(&self, name: &str) -> Result<ByteStream> {
        let url = self.object_url(name)?;
        trace!(%url, "GET object content");
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::not_found(name));
        }
        let response = response.error_for_status()?;
        Ok(response.bytes_stream().map_err(Error::from).boxed())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let url = self.object_url(name)?;
        debug!(%url, "DELETE object");
        let response = self.client.delete(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        response.error_for_status()?;
        Ok(())
    }
}

/// Builder for configuring an [`HttpObjectStore`]
#[derive(Debug, Clone)]
pub struct HttpObjectStoreBuilder {
    base_url: Option<String>,
    connect_timeout_secs: u64,
    request_timeout_secs: u64,
    pool_max_idle_per_host: usize,
}

impl HttpObjectStoreBuilder {
    /// Create a builder with default values.
    pub fn new() -> Self {
        Self {
            base_url: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
        }
    }

    /// Set the store's base URL (scheme, host, and any path prefix).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the connection timeout in seconds.
    pub fn connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Set the request timeout in seconds.
    pub fn request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Set the maximum idle connections per host.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Build the store.
    pub fn build(self) -> Result<HttpObjectStore> {
        let raw = self
            .base_url
            .ok_or_else(|| Error::invalid_url("base url not set"))?;
        // A trailing slash makes Url::join append object names instead of
        // replacing the last path segment.
        let normalized = if raw.ends_with('/') {
            raw
        } else {
            format!("{raw}/")
        };
        let base_url = Url::parse(&normalized).map_err(|_| Error::invalid_url(normalized))?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .timeout(Duration::from_secs(self.request_timeout_secs))
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .build()?;

        Ok(HttpObjectStore { client, base_url })
    }
}

impl Default for HttpObjectStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
