//! Trait seams between the cache, the transport and the fetcher.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::WriteOutcome;

/// Response returned by a [`Transport`].
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub status: u16,
    /// Header names lowercased.
    pub headers: BTreeMap<String, String>,
    /// Empty for HEAD.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// HTTP access to the keyword management service.
///
/// Implementations reject missing credentials and any status other than 2xx
/// or 304 with `Error::Transport`. They do not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Retrieve the full document at `uri`.
    async fn get(&self, uri: &str) -> Result<TransportResponse>;

    /// Retrieve only the metadata for `uri`.
    async fn head(&self, uri: &str) -> Result<TransportResponse>;
}

/// Versioned store of raw scheme documents.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read the stored bytes, `None` when no entry exists.
    async fn read(&self, version: &str, scheme: &str) -> Result<Option<Vec<u8>>>;

    /// Persist `data` unless an entry with the same digest already exists.
    async fn write(&self, version: &str, scheme: &str, data: &[u8]) -> Result<WriteOutcome>;

    /// Digest of the stored bytes, `None` when no entry exists.
    async fn digest_of(&self, version: &str, scheme: &str) -> Result<Option<String>>;

    /// Version most recently recorded for `scheme`, `None` when nothing is cached.
    async fn latest_version(&self, scheme: &str) -> Result<Option<String>>;

    /// Record `version` as the current version of `scheme`.
    async fn set_latest_version(&self, scheme: &str, version: &str) -> Result<()>;
}
