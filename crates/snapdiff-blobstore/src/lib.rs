//! Content-addressed blob retrieval for the snapdiff engine
//!
//! An [`ObjectStore`] exposes attributes, a streaming reader, and deletion
//! for named objects; [`HttpObjectStore`] talks to a real store over HTTP
//! and [`MemoryObjectStore`] backs tests. On top of that, [`BlobFetcher`]
//! implements the verified fetch protocol: read the object's expected size
//! and MD5 once, then stream the body with an incremental hash, retrying
//! on IO errors or corruption and recording digests that stay unavailable.
//!
//! # Example
//!
//! ```no_run
//! use snapdiff_blobstore::HttpObjectStore;
//!
//! # fn main() -> Result<(), snapdiff_blobstore::Error> {
//! let store = HttpObjectStore::builder()
//!     .base_url("https://storage.example.com/snapdiff-images")
//!     .connect_timeout(10)
//!     .build()?;
//! # let _ = store;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod error;
mod fetcher;
mod http;
mod memory;
mod store;

pub use error::{Error, Result};
pub use fetcher::{BlobFetcher, MAX_TRIES};
pub use http::{HttpObjectStore, HttpObjectStoreBuilder};
pub use memory::MemoryObjectStore;
pub use store::{ByteStream, ObjectAttrs, ObjectStore};
