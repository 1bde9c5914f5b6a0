//! Probe-before-fetch orchestration of scheme downloads.
//!
//! ## Fetch Order
//!
//! For one scheme the fetcher:
//! 1. Looks up the digest of the cached copy under the last known version
//! 2. If a copy exists, issues a HEAD and compares the remote `ETag`
//! 3. Skips when the digests match (no GET, no validation, no write)
//! 4. Otherwise GETs the document, validates it, reads the embedded
//!    `gcmd:keywordVersion` and writes it to the cache under that version
//!
//! The whole sequence for a scheme runs behind a per-scheme gate so two
//! callers never race on the same cache entry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use futures::stream::{self, StreamExt};
use gcmd_core::{
    compute_digest, defaults, is_known_scheme, keyword_version, list_schemes, logging,
    normalize_remote_digest, validate_document, CacheStore, Error, FetchResult, FetchStatus,
    GcmdConfig, Result, SchemeOutcome, Transport, ROOT_SCHEME,
};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, field, info, instrument, Span};

const NOT_MODIFIED: u16 = 304;

/// Fetches scheme documents into a [`CacheStore`].
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    store: Arc<dyn CacheStore>,
    concepts_url: String,
    default_version: String,
    known_versions: RwLock<HashMap<String, String>>,
    gates: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
    concurrency: usize,
}

impl Fetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CacheStore>,
        config: &GcmdConfig,
    ) -> Self {
        Self {
            transport,
            store,
            concepts_url: format!(
                "{}{}",
                config.base_url.trim_end_matches('/'),
                defaults::CONCEPTS_PATH
            ),
            default_version: config.keyword_version.clone(),
            known_versions: RwLock::new(HashMap::new()),
            gates: StdMutex::new(HashMap::new()),
            concurrency: config.fetch_concurrency.max(1),
        }
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Remote URI of a scheme document.
    pub fn scheme_uri(&self, scheme: &str) -> String {
        if scheme == ROOT_SCHEME {
            format!("{}{}{}", self.concepts_url, scheme, defaults::RDF_FORMAT_QUERY)
        } else {
            format!(
                "{}{}{}{}",
                self.concepts_url,
                defaults::CONCEPT_SCHEME_SEGMENT,
                scheme,
                defaults::RDF_FORMAT_QUERY
            )
        }
    }

    /// Last known version of `scheme`.
    ///
    /// Looked up in memory first, then recovered from the cache store, and
    /// only then the configured keyword version.
    pub async fn current_version(&self, scheme: &str) -> Result<String> {
        if let Some(version) = self.known_versions.read().await.get(scheme) {
            return Ok(version.clone());
        }

        match self.store.latest_version(scheme).await? {
            Some(version) => {
                debug!(scheme = %scheme, version = %version, "Recovered cached version");
                self.known_versions
                    .write()
                    .await
                    .insert(scheme.to_string(), version.clone());
                Ok(version)
            }
            None => Ok(self.default_version.clone()),
        }
    }

    fn gate(&self, scheme: &str) -> Arc<Mutex<()>> {
        let mut gates = self.gates.lock().unwrap_or_else(|e| e.into_inner());
        gates
            .entry(scheme.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Fetch one scheme, skipping the download when the cached copy is current.
    #[instrument(skip(self), fields(
        subsystem = "fetch",
        component = "fetcher",
        op = "fetch_scheme",
        version = field::Empty,
        digest = field::Empty,
        fetch_status = field::Empty,
    ))]
    pub async fn fetch_scheme(&self, scheme: &str) -> Result<FetchResult> {
        if !is_known_scheme(scheme) {
            return Err(Error::UnknownScheme(scheme.to_string()));
        }

        let gate = self.gate(scheme);
        let _guard = gate.lock().await;

        let uri = self.scheme_uri(scheme);
        let known_version = self.current_version(scheme).await?;
        let span = Span::current();

        let local = self.store.digest_of(&known_version, scheme).await?;
        if let Some(local) = &local {
            let head = self.transport.head(&uri).await?;
            let remote = head.header("etag").and_then(normalize_remote_digest);
            debug!(local = %local, remote = ?remote, "Compared cached digest with remote");

            if remote.as_deref() == Some(local.as_str()) {
                info!("Cached copy is current, skipping download");
                return Ok(skipped(scheme, known_version, local.clone()));
            }
        } else {
            debug!(version = %known_version, "No cached copy, downloading");
        }

        let response = self.transport.get(&uri).await?;
        if response.status == NOT_MODIFIED {
            return match local {
                Some(local) => {
                    info!("Remote reports not modified, keeping cached copy");
                    Ok(skipped(scheme, known_version, local))
                }
                None => Err(Error::Transport(format!(
                    "GET {} returned 304 Not Modified but no cached copy exists",
                    uri
                ))),
            };
        }
        let payload = response.body;

        let validation = validate_document(&payload);
        if !validation.valid {
            let reason = validation
                .reason
                .unwrap_or_else(|| "rejected by validator".to_string());
            error!(reason = %reason, stage = ?validation.stage, "Fetched document is invalid");
            return Err(Error::invalid_document(scheme, reason));
        }

        let version = keyword_version(&payload)
            .ok_or_else(|| Error::invalid_document(scheme, "missing gcmd:keywordVersion"))?;
        let digest = compute_digest(&payload);
        let outcome = self.store.write(&version, scheme, &payload).await?;
        self.store.set_latest_version(scheme, &version).await?;

        self.known_versions
            .write()
            .await
            .insert(scheme.to_string(), version.clone());

        span.record(logging::VERSION, version.as_str());
        span.record(logging::DIGEST, digest.as_str());
        span.record(logging::FETCH_STATUS, "fetched");
        info!(
            concept_count = validation.concept_count,
            bytes = payload.len(),
            write_outcome = %outcome,
            "Fetched scheme document"
        );

        Ok(FetchResult {
            scheme: scheme.to_string(),
            status: FetchStatus::Fetched,
            version,
            digest,
            write: Some(outcome),
        })
    }

    /// Fetch `root` and every registered scheme; one failure never stops the rest.
    ///
    /// Outcomes come back in registry order.
    pub async fn fetch_all(&self) -> Vec<SchemeOutcome<FetchResult>> {
        let schemes = list_schemes(true);

        let mut outcomes: Vec<SchemeOutcome<FetchResult>> = stream::iter(schemes.iter().copied())
            .map(|scheme| async move {
                SchemeOutcome {
                    scheme: scheme.to_string(),
                    result: self.fetch_scheme(scheme).await,
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        outcomes.sort_by_key(|o| schemes.iter().position(|s| *s == o.scheme));

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        for outcome in &outcomes {
            if let Err(e) = &outcome.result {
                error!(scheme = %outcome.scheme, error = %e, "Scheme fetch failed");
            }
        }
        info!(
            total = outcomes.len(),
            failed = failed,
            "Fetch of all schemes finished"
        );
        outcomes
    }
}

fn skipped(scheme: &str, version: String, digest: String) -> FetchResult {
    let span = Span::current();
    span.record(logging::VERSION, version.as_str());
    span.record(logging::DIGEST, digest.as_str());
    span.record(logging::FETCH_STATUS, "skipped");
    FetchResult {
        scheme: scheme.to_string(),
        status: FetchStatus::Skipped,
        version,
        digest,
        write: None,
    }
}
