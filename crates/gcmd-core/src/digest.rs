//! Content digests shared by the cache store and the fetcher.
//!
//! One algorithm everywhere: SHA-256, lowercase hex, no prefix. The same
//! string is stored in `FetchResult`, compared on the write path and compared
//! against the `ETag` reported by the remote on HEAD.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of `data` as 64 lowercase hex characters.
pub fn compute_digest(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Incremental hasher for streaming cached files.
#[derive(Default)]
pub struct DigestWriter {
    hasher: Sha256,
}

impl DigestWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
    }

    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

/// Normalize a remote-reported digest (an `ETag` value) for comparison.
///
/// Strips a weak validator prefix and surrounding quotes and lowercases the
/// rest. Returns `None` for an empty value.
pub fn normalize_remote_digest(raw: &str) -> Option<String> {
    let value = raw.trim();
    let value = value.strip_prefix("W/").unwrap_or(value);
    let value = value.trim_matches('"').trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_ascii_lowercase())
    }
}
