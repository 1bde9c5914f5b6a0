//! # gcmd-fetch
//!
//! Conditional retrieval of KMS scheme documents.
//!
//! This crate provides:
//! - [`HttpTransport`]: reqwest-backed GET/HEAD with basic authentication
//! - [`Fetcher`]: check-before-fetch orchestration that validates payloads,
//!   extracts the embedded keyword version and writes through a
//!   [`gcmd_core::CacheStore`]
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gcmd_core::{CacheStore, GcmdConfig, Transport};
//! use gcmd_fetch::{Fetcher, HttpTransport};
//!
//! # async fn run(store: Arc<dyn CacheStore>) -> gcmd_core::Result<()> {
//! let config = GcmdConfig::from_env();
//! let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config)?);
//! let fetcher = Fetcher::new(transport, store, &config);
//! let result = fetcher.fetch_scheme("instruments").await?;
//! println!("{} {} {}", result.scheme, result.status, result.version);
//! # Ok(())
//! # }
//! ```

pub mod fetcher;
pub mod http;

pub use fetcher::Fetcher;
pub use http::HttpTransport;
