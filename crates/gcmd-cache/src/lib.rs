//! # gcmd-cache
//!
//! Versioned, content-addressed disk cache for raw KMS scheme documents.
//!
//! Layout: `{root}/{version}/{scheme}`, one file per scheme holding the bytes
//! exactly as received. Writes are skipped when the stored digest already
//! matches, and land atomically through a temp file and rename.
//!
//! ## Example
//!
//! ```rust,ignore
//! use gcmd_cache::DiskCacheStore;
//! use gcmd_core::CacheStore;
//!
//! let store = DiskCacheStore::new("/var/cache/gcmd");
//! let outcome = store.write("8.6", "instruments", &bytes).await?;
//! let cached = store.read("8.6", "instruments").await?;
//! ```

pub mod disk;

pub use disk::DiskCacheStore;
pub use gcmd_core::{compute_digest, CacheStore, WriteOutcome};
