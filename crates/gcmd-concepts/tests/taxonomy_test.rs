//! Taxonomy façade over a real disk cache and an in-memory transport.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gcmd_cache::DiskCacheStore;
use gcmd_concepts::Taxonomy;
use gcmd_core::{
    compute_digest, CacheStore, Error, FetchStatus, GcmdConfig, Result, Transport,
    TransportResponse,
};

const INSTRUMENTS: &str = include_str!("fixtures/instruments.rdf");
const ROOT: &str = include_str!("fixtures/root.rdf");

/// Serves documents keyed by scheme name, with the SHA-256 digest as `ETag`.
#[derive(Default)]
struct FixtureTransport {
    documents: Mutex<HashMap<String, Vec<u8>>>,
    gets: AtomicUsize,
    heads: AtomicUsize,
}

impl FixtureTransport {
    fn serving(documents: &[(&str, &str)]) -> Arc<Self> {
        let transport = Self::default();
        for (scheme, body) in documents {
            transport.set(scheme, body);
        }
        Arc::new(transport)
    }

    fn set(&self, scheme: &str, body: &str) {
        self.documents
            .lock()
            .unwrap()
            .insert(scheme.to_string(), body.as_bytes().to_vec());
    }

    fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    fn heads(&self) -> usize {
        self.heads.load(Ordering::SeqCst)
    }

    fn lookup(&self, uri: &str) -> Result<Vec<u8>> {
        let path = uri.split('?').next().unwrap_or(uri);
        let scheme = path.rsplit('/').next().unwrap_or(path);
        self.documents
            .lock()
            .unwrap()
            .get(scheme)
            .cloned()
            .ok_or_else(|| Error::Transport(format!("GET {} failed with status: 404", uri)))
    }

    fn response(body: &[u8], include_body: bool) -> TransportResponse {
        let mut headers = BTreeMap::new();
        headers.insert("etag".to_string(), format!("\"{}\"", compute_digest(body)));
        TransportResponse {
            status: 200,
            headers,
            body: if include_body { body.to_vec() } else { Vec::new() },
        }
    }
}

#[async_trait]
impl Transport for FixtureTransport {
    async fn get(&self, uri: &str) -> Result<TransportResponse> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let body = self.lookup(uri)?;
        Ok(Self::response(&body, true))
    }

    async fn head(&self, uri: &str) -> Result<TransportResponse> {
        self.heads.fetch_add(1, Ordering::SeqCst);
        let body = self.lookup(uri)?;
        Ok(Self::response(&body, false))
    }
}

struct Harness {
    taxonomy: Taxonomy,
    transport: Arc<FixtureTransport>,
    store: Arc<DiskCacheStore>,
    dir: tempfile::TempDir,
}

fn harness_with(transport: Arc<FixtureTransport>, keyword_version: &str) -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = GcmdConfig::default().with_cache_dir(dir.path());
    config.keyword_version = keyword_version.to_string();

    let store = Arc::new(DiskCacheStore::new(dir.path()));
    let taxonomy = Taxonomy::with_parts(transport.clone(), store.clone(), &config);
    Harness {
        taxonomy,
        transport,
        store,
        dir,
    }
}

fn harness() -> Harness {
    harness_with(
        FixtureTransport::serving(&[("root", ROOT), ("instruments", INSTRUMENTS)]),
        "Jun122012",
    )
}

#[tokio::test]
async fn test_cache_miss_fetches_once_then_serves_from_memory() {
    let h = harness();

    let first = h.taxonomy.snapshot("instruments").await.unwrap();
    assert_eq!(first.version, "8.6");
    assert_eq!(h.transport.gets(), 1);
    assert_eq!(h.transport.heads(), 0);
    assert!(h.store.read("8.6", "instruments").await.unwrap().is_some());

    let second = h.taxonomy.snapshot("instruments").await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(h.transport.gets(), 1);
    assert_eq!(h.transport.heads(), 0);
}

#[tokio::test]
async fn test_preloaded_cache_needs_no_network() {
    let h = harness_with(FixtureTransport::serving(&[]), "8.6");
    h.store
        .write("8.6", "instruments", INSTRUMENTS.as_bytes())
        .await
        .unwrap();

    let names = h.taxonomy.names("instruments").await.unwrap();
    assert_eq!(names.len(), 6);
    assert_eq!(names[0], "Instruments");
    assert_eq!(h.transport.gets() + h.transport.heads(), 0);
}

#[tokio::test]
async fn test_invalid_cached_payload_is_rejected() {
    let h = harness();
    h.store
        .write("Jun122012", "instruments", b"<html>maintenance</html>")
        .await
        .unwrap();

    let err = h.taxonomy.triples("instruments").await.unwrap_err();
    assert!(matches!(err, Error::InvalidDocument { .. }), "got {:?}", err);
    assert_eq!(h.transport.gets(), 0);
}

#[tokio::test]
async fn test_unknown_scheme() {
    let h = harness();
    let err = h.taxonomy.triples("nonsense").await.unwrap_err();
    assert!(matches!(err, Error::UnknownScheme(_)));
    assert_eq!(h.transport.gets(), 0);
}

#[tokio::test]
async fn test_root_sorted_without_placeholder() {
    let h = harness();
    let root = h.taxonomy.root().await.unwrap();

    assert_eq!(root.len(), 3);
    assert!(root.iter().all(|t| t.label != "Trash Can"));
    assert!(root.windows(2).all(|w| w[0].id <= w[1].id));
    let last = root.last().unwrap();
    assert_eq!(last.id, "fb0b9fcd-5c96-4989-8c64-a479bbed83ab");
    assert_eq!(last.label, "Projects");
}

#[tokio::test]
async fn test_discovered_schemes_skip_trash() {
    let h = harness();
    let schemes = h.taxonomy.discovered_schemes().await.unwrap();
    assert_eq!(schemes, vec!["instruments", "projects", "providers"]);
}

#[tokio::test]
async fn test_concept_breadcrumb() {
    let h = harness();
    let gtr = h.taxonomy.concept("instruments", "gtr").await.unwrap().unwrap();

    assert_eq!(
        gtr.breadcrumb_title,
        "GTR (Instruments > In Situ/Laboratory Instruments > Recorders/Loggers)"
    );
    assert_eq!(gtr.ancestor_ids(), vec!["recorders-loggers", "in-situ", "instruments"]);
    assert!(h.taxonomy.concept("instruments", "missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_filter_defaults_and_case() {
    let h = harness();
    let all = h.taxonomy.filter("instruments", "", None).await.unwrap();
    assert_eq!(all, h.taxonomy.triples("instruments").await.unwrap());

    let upper = h.taxonomy.filter("instruments", "LO", None).await.unwrap();
    let lower = h.taxonomy.filter("instruments", "lo", None).await.unwrap();
    assert_eq!(upper, lower);
    let ids: Vec<&str> = lower.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["recorders-loggers", "data-logger"]);

    let window = h.taxonomy.filter("instruments", "", Some(0..2)).await.unwrap();
    assert_eq!(window.len(), 2);
}

#[tokio::test]
async fn test_resolve_all_isolates_failures() {
    let h = harness();
    let outcomes = h.taxonomy.resolver().resolve_all().await;

    assert_eq!(outcomes.len(), 15);
    let ok: Vec<&str> = outcomes
        .iter()
        .filter(|o| o.is_ok())
        .map(|o| o.scheme.as_str())
        .collect();
    assert_eq!(ok, vec!["root", "instruments"]);

    let platforms = outcomes.iter().find(|o| o.scheme == "platforms").unwrap();
    assert!(matches!(platforms.result, Err(Error::Transport(_))));
}

#[tokio::test]
async fn test_export_skips_root_and_reports_failures() {
    let h = harness();
    let (documents, failures) = h.taxonomy.export().await;

    assert_eq!(documents.len(), 6);
    assert!(documents.iter().all(|d| d.collection == "instruments"));
    assert_eq!(failures.len(), 13);
}

#[tokio::test]
async fn test_refresh_of_unchanged_remote_is_skipped() {
    let h = harness();
    let before = h.taxonomy.snapshot("instruments").await.unwrap();

    let after = h.taxonomy.resolver().refresh("instruments").await.unwrap();
    assert_eq!(h.transport.gets(), 1);
    assert_eq!(h.transport.heads(), 1);
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(before.len(), after.len());
}

#[tokio::test]
async fn test_refresh_picks_up_new_version() {
    let h = harness();
    h.taxonomy.snapshot("instruments").await.unwrap();

    let updated = INSTRUMENTS
        .replace("8.6", "8.7")
        .replace("DATA LOGGERS", "Data Loggers");
    h.transport.set("instruments", &updated);

    let snapshot = h.taxonomy.resolver().refresh("instruments").await.unwrap();
    assert_eq!(snapshot.version, "8.7");
    assert_eq!(snapshot.get("data-logger").unwrap().label(), "Data Loggers");
    assert!(h.store.read("8.6", "instruments").await.unwrap().is_some());
    assert!(h.store.read("8.7", "instruments").await.unwrap().is_some());
}

#[tokio::test]
async fn test_new_process_reuses_populated_cache() {
    let h = harness();
    h.taxonomy.snapshot("instruments").await.unwrap();
    assert_eq!(h.transport.gets(), 1);

    let config = GcmdConfig::default().with_cache_dir(h.dir.path());
    let store = Arc::new(DiskCacheStore::new(h.dir.path()));
    let restarted = Taxonomy::with_parts(h.transport.clone(), store, &config);

    let snapshot = restarted.snapshot("instruments").await.unwrap();
    assert_eq!(snapshot.version, "8.6");
    assert_eq!(h.transport.gets(), 1);
    assert_eq!(h.transport.heads(), 0);

    let fetched = restarted.fetch_scheme("instruments").await.unwrap();
    assert_eq!(fetched.status, FetchStatus::Skipped);
    assert_eq!(fetched.version, "8.6");
    assert_eq!(h.transport.gets(), 1);
    assert_eq!(h.transport.heads(), 1);
}

#[tokio::test]
async fn test_populated_cache_works_without_remote() {
    let h = harness();
    h.taxonomy.snapshot("instruments").await.unwrap();

    let config = GcmdConfig::default().with_cache_dir(h.dir.path());
    let offline = Taxonomy::with_parts(
        FixtureTransport::serving(&[]),
        Arc::new(DiskCacheStore::new(h.dir.path())),
        &config,
    );
    let names = offline.names("instruments").await.unwrap();
    assert_eq!(names.len(), 6);
}

#[tokio::test]
async fn test_invalidate_forces_rebuild_from_cache() {
    let h = harness();
    let first = h.taxonomy.snapshot("instruments").await.unwrap();

    assert!(h.taxonomy.resolver().invalidate("instruments").await);
    assert!(!h.taxonomy.resolver().invalidate("instruments").await);

    let second = h.taxonomy.snapshot("instruments").await.unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(h.transport.gets(), 1);
}

#[tokio::test]
async fn test_from_config_prepares_cache_root() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("kms");
    let config = GcmdConfig::default().with_cache_dir(&root);

    Taxonomy::from_config(&config).await.unwrap();
    assert!(root.is_dir());
}

#[tokio::test]
async fn test_from_config_rejects_unusable_cache_root() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("not-a-dir");
    std::fs::write(&file, b"x").unwrap();
    let config = GcmdConfig::default().with_cache_dir(&file);

    let err = Taxonomy::from_config(&config).await.err().unwrap();
    assert!(matches!(err, Error::Storage { .. }), "got {:?}", err);
}
