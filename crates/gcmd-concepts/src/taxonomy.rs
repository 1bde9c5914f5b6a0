//! Scheme-level query façade.
//!
//! [`Taxonomy`] ties the cache, the fetcher and the resolver together and
//! exposes the listings callers actually want, keyed by scheme name.

use std::ops::Range;
use std::sync::Arc;

use gcmd_cache::DiskCacheStore;
use gcmd_core::{
    CacheStore, ConceptTriple, FetchResult, GcmdConfig, ResolvedConcept, Result, SchemeOutcome,
    SchemeSnapshot, Transport, ROOT_SCHEME,
};
use gcmd_fetch::{Fetcher, HttpTransport};
use tracing::info;

use crate::export::{export_documents, ConceptDocument};
use crate::query;
use crate::resolver::HierarchyResolver;

pub struct Taxonomy {
    resolver: HierarchyResolver,
}

impl Taxonomy {
    pub fn new(resolver: HierarchyResolver) -> Self {
        Self { resolver }
    }

    /// Wire up a disk cache and HTTP transport from configuration.
    ///
    /// Fails early when the cache root cannot be written.
    pub async fn from_config(config: &GcmdConfig) -> Result<Self> {
        config.validate()?;
        let disk = DiskCacheStore::new(config.cache_dir.clone());
        disk.validate().await?;
        let store: Arc<dyn CacheStore> = Arc::new(disk);
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config)?);
        Ok(Self::with_parts(transport, store, config))
    }

    pub fn with_parts(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CacheStore>,
        config: &GcmdConfig,
    ) -> Self {
        info!(
            cache = %config.cache_dir.display(),
            version = %config.keyword_version,
            "Initializing taxonomy"
        );
        let fetcher = Arc::new(Fetcher::new(transport, store, config));
        Self::new(HierarchyResolver::new(fetcher))
    }

    pub fn resolver(&self) -> &HierarchyResolver {
        &self.resolver
    }

    pub async fn snapshot(&self, scheme: &str) -> Result<Arc<SchemeSnapshot>> {
        self.resolver.resolve(scheme).await
    }

    pub async fn triples(&self, scheme: &str) -> Result<Vec<ConceptTriple>> {
        Ok(query::triples(&*self.snapshot(scheme).await?))
    }

    pub async fn tuples(&self, scheme: &str) -> Result<Vec<(String, String)>> {
        Ok(query::tuples(&*self.snapshot(scheme).await?))
    }

    pub async fn names(&self, scheme: &str) -> Result<Vec<String>> {
        Ok(query::names(&*self.snapshot(scheme).await?))
    }

    /// Scheme entry points, sorted by id.
    pub async fn root(&self) -> Result<Vec<ConceptTriple>> {
        Ok(query::sorted_triples(&*self.snapshot(ROOT_SCHEME).await?))
    }

    /// Label search; `range` defaults to the first hundred matches.
    pub async fn filter(
        &self,
        scheme: &str,
        query: &str,
        range: Option<Range<usize>>,
    ) -> Result<Vec<ConceptTriple>> {
        let snapshot = self.snapshot(scheme).await?;
        Ok(query::filter(
            &snapshot,
            query,
            range.unwrap_or_else(query::default_range),
        ))
    }

    pub async fn narrower(&self, scheme: &str) -> Result<Vec<(String, String)>> {
        Ok(query::narrower(&*self.snapshot(scheme).await?))
    }

    /// Scheme names the root document points at.
    pub async fn discovered_schemes(&self) -> Result<Vec<String>> {
        Ok(query::discovered_schemes(&*self.snapshot(ROOT_SCHEME).await?))
    }

    /// A single concept with its hierarchy.
    pub async fn concept(&self, scheme: &str, id: &str) -> Result<Option<ResolvedConcept>> {
        Ok(self.snapshot(scheme).await?.get(id).cloned())
    }

    pub async fn fetch_scheme(&self, scheme: &str) -> Result<FetchResult> {
        self.resolver.fetcher().fetch_scheme(scheme).await
    }

    pub async fn fetch_all(&self) -> Vec<SchemeOutcome<FetchResult>> {
        self.resolver.fetcher().fetch_all().await
    }

    /// Export documents for every scheme that resolves.
    ///
    /// Schemes that fail are returned alongside so callers can report them.
    pub async fn export(&self) -> (Vec<ConceptDocument>, Vec<SchemeOutcome<()>>) {
        let mut documents = Vec::new();
        let mut failures = Vec::new();
        for outcome in self.resolver.resolve_all().await {
            match outcome.result {
                Ok(snapshot) if snapshot.scheme_name != ROOT_SCHEME => {
                    documents.extend(export_documents(&snapshot));
                }
                Ok(_) => {}
                Err(e) => failures.push(SchemeOutcome {
                    scheme: outcome.scheme,
                    result: Err(e),
                }),
            }
        }
        (documents, failures)
    }
}
