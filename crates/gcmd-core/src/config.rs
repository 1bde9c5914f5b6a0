//! Runtime configuration for the keyword cache.
//!
//! Configuration is read from `GCMD_*` environment variables (a `.env` file is
//! loaded by the binary before this runs):
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | GCMD_BASE_URL | https://gcmdservices.gsfc.nasa.gov | KMS host |
//! | GCMD_CACHE | $HOME/.gcmd | Cache root directory |
//! | GCMD_KEYWORD_VERSION | Jun122012 | Version assumed before the first fetch |
//! | GCMD_HTTP_USERNAME | (none) | Basic-auth principal |
//! | GCMD_HTTP_PASSWORD | (none) | Basic-auth password |
//! | GCMD_HTTP_TIMEOUT_SECS | 60 | Per-request timeout |
//! | GCMD_FETCH_CONCURRENCY | 4 | Schemes fetched in parallel by `fetch_all` |

use std::fmt;
use std::path::PathBuf;

use tracing::debug;

use crate::defaults;
use crate::error::{Error, Result};

/// Keyword cache configuration.
#[derive(Clone)]
pub struct GcmdConfig {
    /// KMS host, without the `/kms/concepts/` path.
    pub base_url: String,
    /// Root of the versioned cache layout.
    pub cache_dir: PathBuf,
    /// Version used to locate cached documents before anything is fetched.
    pub keyword_version: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
    pub fetch_concurrency: usize,
}

impl Default for GcmdConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::KMS_BASE_URL.to_string(),
            cache_dir: default_cache_dir(),
            keyword_version: defaults::KEYWORD_VERSION.to_string(),
            username: None,
            password: None,
            timeout_secs: defaults::HTTP_TIMEOUT_SECS,
            fetch_concurrency: defaults::FETCH_CONCURRENCY,
        }
    }
}

impl fmt::Debug for GcmdConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcmdConfig")
            .field("base_url", &self.base_url)
            .field("cache_dir", &self.cache_dir)
            .field("keyword_version", &self.keyword_version)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|p| mask(p)))
            .field("timeout_secs", &self.timeout_secs)
            .field("fetch_concurrency", &self.fetch_concurrency)
            .finish()
    }
}

impl GcmdConfig {
    /// Build configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("GCMD_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(cache) = std::env::var("GCMD_CACHE") {
            config.cache_dir = PathBuf::from(cache);
        }
        if let Ok(version) = std::env::var("GCMD_KEYWORD_VERSION") {
            config.keyword_version = version;
        }
        config.username = std::env::var("GCMD_HTTP_USERNAME").ok();
        config.password = std::env::var("GCMD_HTTP_PASSWORD").ok();
        config.timeout_secs = std::env::var("GCMD_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::HTTP_TIMEOUT_SECS);
        config.fetch_concurrency = std::env::var("GCMD_FETCH_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::FETCH_CONCURRENCY);

        debug!(config = ?config, "Loaded configuration from environment");
        config
    }

    /// Builder-style override of the cache root.
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    /// Builder-style override of the KMS host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Builder-style credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        if self.keyword_version.trim().is_empty() {
            return Err(Error::Config("keyword_version cannot be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be greater than 0".to_string()));
        }
        if self.fetch_concurrency == 0 {
            return Err(Error::Config(
                "fetch_concurrency must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// True when both username and password are present and non-empty.
    pub fn has_credentials(&self) -> bool {
        matches!(
            (&self.username, &self.password),
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty()
        )
    }
}

fn default_cache_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(defaults::CACHE_DIR_NAME)
}

fn mask(secret: &str) -> String {
    "*".repeat(secret.chars().count())
}
