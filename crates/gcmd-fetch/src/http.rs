//! reqwest-backed transport for the keyword management service.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use gcmd_core::{Error, GcmdConfig, Result, Transport, TransportResponse};
use reqwest::{Client, Method, StatusCode, Url};
use tracing::{debug, info, instrument};

/// HTTP transport with basic authentication.
///
/// Relative URIs are joined to the base URL; absolute `http(s)://` URIs are
/// used as given.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl HttpTransport {
    /// Create a transport from configuration.
    pub fn new(config: &GcmdConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!(
            "Initializing KMS transport: url={}, timeout={}s",
            config.base_url, config.timeout_secs
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Create from `GCMD_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(&GcmdConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Host name of the base URL.
    pub fn host(&self) -> Option<String> {
        Url::parse(&self.base_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
    }

    /// Absolute URL for `uri`.
    pub fn resolve(&self, uri: &str) -> String {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            uri.to_string()
        } else {
            format!("{}/{}", self.base_url, uri.trim_start_matches('/'))
        }
    }

    fn credentials(&self, url: &str) -> Result<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Ok((u, p)),
            _ => Err(Error::Transport(format!(
                "Please provide username/password for {}",
                url
            ))),
        }
    }

    async fn send(&self, method: Method, uri: &str) -> Result<TransportResponse> {
        let url = self.resolve(uri);
        let (username, password) = self.credentials(&url)?;
        debug!(
            "{} {} [{}:{}]",
            method,
            url,
            username,
            "*".repeat(password.chars().count())
        );

        let start = Instant::now();
        let response = self
            .client
            .request(method.clone(), &url)
            .basic_auth(username, Some(password))
            .send()
            .await?;

        let status = response.status();
        debug!(
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "{} {} completed",
            method,
            url
        );
        if !(status.is_success() || status == StatusCode::NOT_MODIFIED) {
            return Err(Error::Transport(format!(
                "{} {} failed with status: {}",
                method,
                url,
                status.as_u16()
            )));
        }

        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let body = if method == Method::HEAD {
            Vec::new()
        } else {
            response.bytes().await?.to_vec()
        };

        Ok(TransportResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self), fields(subsystem = "fetch", component = "http", op = "get"))]
    async fn get(&self, uri: &str) -> Result<TransportResponse> {
        self.send(Method::GET, uri).await
    }

    #[instrument(skip(self), fields(subsystem = "fetch", component = "http", op = "head"))]
    async fn head(&self, uri: &str) -> Result<TransportResponse> {
        self.send(Method::HEAD, uri).await
    }
}
