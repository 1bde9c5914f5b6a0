//! Hierarchy resolution: raw scheme documents to indexed snapshots.
//!
//! ## Resolution Steps
//!
//! 1. Index every concept by id (single pass, duplicates rejected)
//! 2. Check narrower references; unresolved children become warnings
//! 3. Classify each concept as root, branch or leaf
//! 4. Walk `broader` pointers iteratively, bounded by the concept count
//! 5. Build the breadcrumb title from the ancestor labels
//!
//! ## Error Handling
//!
//! - Dangling broader reference: `Error::DanglingReference`, snapshot rejected
//! - Ancestor walk longer than the scheme: `Error::CycleDetected`
//! - Dangling narrower reference: logged and recorded, snapshot kept

use std::collections::HashMap;
use std::io::ErrorKind;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use gcmd_core::{
    defaults, is_known_scheme, list_schemes, logging, parse_concepts, validate_document,
    Ancestor, CacheStore, ConceptRecord, DataIntegrityWarning, Error, IntegrityRelation,
    ResolvedConcept, Result, SchemeOutcome, SchemeSnapshot, TreePosition,
};
use gcmd_fetch::Fetcher;
use tokio::sync::RwLock;
use tracing::{debug, field, info, instrument, warn, Span};

/// Build a snapshot from parsed records.
pub fn build_snapshot(
    scheme_name: &str,
    version: &str,
    records: Vec<ConceptRecord>,
    fetched_at: DateTime<Utc>,
) -> Result<SchemeSnapshot> {
    let mut index = HashMap::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        if index.insert(record.id.clone(), i).is_some() {
            return Err(Error::invalid_document(
                scheme_name,
                format!("duplicate concept id {}", record.id),
            ));
        }
    }

    let mut warnings = Vec::new();
    for record in &records {
        for child in &record.narrower_ids {
            if !index.contains_key(child) {
                warn!(
                    scheme = %scheme_name,
                    concept_id = %record.id,
                    missing_id = %child,
                    "Narrower concept not found in scheme"
                );
                warnings.push(DataIntegrityWarning {
                    concept_id: record.id.clone(),
                    missing_id: child.clone(),
                    relation: IntegrityRelation::Narrower,
                });
            }
        }
    }

    let mut resolved = Vec::with_capacity(records.len());
    for i in 0..records.len() {
        let ancestors = ancestor_chain(scheme_name, &records, &index, i)?;
        let record = &records[i];
        let tree_position =
            TreePosition::classify(record.broader_id.as_deref(), &record.narrower_ids);
        let placeholder = tree_position == TreePosition::Root
            && defaults::PLACEHOLDER_LABELS.contains(&record.label.as_str());

        resolved.push(ResolvedConcept {
            breadcrumb_title: breadcrumb_title(&record.label, &ancestors),
            record: record.clone(),
            tree_position,
            ancestors,
            placeholder,
        });
    }

    Ok(SchemeSnapshot {
        scheme_name: scheme_name.to_string(),
        version: version.to_string(),
        concepts: resolved,
        index,
        fetched_at,
        warnings,
    })
}

/// Ancestors of `records[start]`, immediate parent first.
///
/// A chain can never be longer than the number of concepts in the scheme.
/// Reaching that bound means the broader pointers loop.
fn ancestor_chain(
    scheme_name: &str,
    records: &[ConceptRecord],
    index: &HashMap<String, usize>,
    start: usize,
) -> Result<Vec<Ancestor>> {
    let limit = records.len();
    let mut chain = Vec::new();
    let mut current = &records[start];

    while let Some(parent_id) = current.broader_id.as_deref() {
        if chain.len() >= limit {
            return Err(Error::CycleDetected {
                scheme: scheme_name.to_string(),
                concept_id: records[start].id.clone(),
                steps: chain.len(),
            });
        }
        let &parent = index
            .get(parent_id)
            .ok_or_else(|| Error::DanglingReference {
                scheme: scheme_name.to_string(),
                concept_id: current.id.clone(),
                missing_id: parent_id.to_string(),
            })?;
        current = &records[parent];
        chain.push(Ancestor {
            id: current.id.clone(),
            label: current.label.clone(),
        });
    }

    Ok(chain)
}

/// `label (top > ... > parent)` for non-root concepts, bare label otherwise.
pub fn breadcrumb_title(label: &str, ancestors: &[Ancestor]) -> String {
    if ancestors.is_empty() {
        return label.to_string();
    }
    let path: Vec<&str> = ancestors.iter().rev().map(|a| a.label.as_str()).collect();
    format!("{} ({})", label, path.join(" > "))
}

/// Resolves schemes into snapshots, loading from the cache and fetching on miss.
///
/// Snapshots are kept in memory per scheme until invalidated or superseded
/// by a newer version.
pub struct HierarchyResolver {
    fetcher: Arc<Fetcher>,
    store: Arc<dyn CacheStore>,
    snapshots: RwLock<HashMap<String, Arc<SchemeSnapshot>>>,
}

impl HierarchyResolver {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        let store = fetcher.store().clone();
        Self {
            fetcher,
            store,
            snapshots: RwLock::new(HashMap::new()),
        }
    }

    pub fn fetcher(&self) -> &Arc<Fetcher> {
        &self.fetcher
    }

    /// Snapshot for `scheme`, built from cached bytes or fetched on a miss.
    #[instrument(skip(self), fields(
        subsystem = "concepts",
        component = "resolver",
        op = "resolve",
        version = field::Empty,
        concept_count = field::Empty,
    ))]
    pub async fn resolve(&self, scheme: &str) -> Result<Arc<SchemeSnapshot>> {
        if !is_known_scheme(scheme) {
            return Err(Error::UnknownScheme(scheme.to_string()));
        }

        let current_version = self.fetcher.current_version(scheme).await?;
        if let Some(snapshot) = self.snapshots.read().await.get(scheme) {
            if snapshot.version == current_version {
                debug!("Snapshot already resolved");
                return Ok(snapshot.clone());
            }
            debug!(stale = %snapshot.version, current = %current_version, "Snapshot superseded");
        }

        let (version, bytes) = self.load(scheme, current_version).await?;
        let snapshot = Arc::new(Self::build(scheme, &version, &bytes)?);

        let span = Span::current();
        span.record(logging::VERSION, version.as_str());
        span.record(logging::CONCEPT_COUNT, snapshot.len());
        info!(warnings = snapshot.warnings.len(), "Resolved scheme snapshot");

        self.snapshots
            .write()
            .await
            .insert(scheme.to_string(), snapshot.clone());
        Ok(snapshot)
    }

    /// Drop the in-memory snapshot; returns whether one was present.
    pub async fn invalidate(&self, scheme: &str) -> bool {
        self.snapshots.write().await.remove(scheme).is_some()
    }

    /// Fetch `scheme` from the remote, then resolve it again.
    pub async fn refresh(&self, scheme: &str) -> Result<Arc<SchemeSnapshot>> {
        self.fetcher.fetch_scheme(scheme).await?;
        self.invalidate(scheme).await;
        self.resolve(scheme).await
    }

    /// Resolve `root` and every registered scheme, collecting each outcome.
    pub async fn resolve_all(&self) -> Vec<SchemeOutcome<Arc<SchemeSnapshot>>> {
        let mut outcomes = Vec::new();
        for scheme in list_schemes(true) {
            let result = self.resolve(scheme).await;
            if let Err(e) = &result {
                warn!(scheme = %scheme, error = %e, "Scheme could not be resolved");
            }
            outcomes.push(SchemeOutcome {
                scheme: scheme.to_string(),
                result,
            });
        }
        outcomes
    }

    async fn load(&self, scheme: &str, version: String) -> Result<(String, Vec<u8>)> {
        if let Some(bytes) = self.store.read(&version, scheme).await? {
            debug!(version = %version, "Loaded scheme from cache");
            return Ok((version, bytes));
        }

        debug!(version = %version, "Cache miss, fetching scheme");
        let fetched = self.fetcher.fetch_scheme(scheme).await?;
        match self.store.read(&fetched.version, scheme).await? {
            Some(bytes) => Ok((fetched.version, bytes)),
            None => Err(Error::storage(
                format!("{}/{}", fetched.version, scheme),
                std::io::Error::new(ErrorKind::NotFound, "entry missing after fetch"),
            )),
        }
    }

    fn build(scheme: &str, version: &str, bytes: &[u8]) -> Result<SchemeSnapshot> {
        let validation = validate_document(bytes);
        if !validation.valid {
            return Err(Error::invalid_document(
                scheme,
                validation
                    .reason
                    .unwrap_or_else(|| "rejected by validator".to_string()),
            ));
        }
        let records = parse_concepts(scheme, version, bytes)?;
        build_snapshot(scheme, version, records, Utc::now())
    }
}
