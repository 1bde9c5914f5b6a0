//! # gcmd-concepts
//!
//! Hierarchy resolution and listings over cached GCMD keyword schemes.
//!
//! This crate provides:
//! - [`HierarchyResolver`]: builds immutable [`gcmd_core::SchemeSnapshot`]s
//!   with tree positions, ancestor chains and breadcrumb titles
//! - [`query`]: pure views (triples, tuples, names, label filter)
//! - [`Taxonomy`]: scheme-keyed façade over cache, fetcher and resolver
//! - [`export`]: flat JSON documents for search indexing
//!
//! # Example
//!
//! ```rust,no_run
//! use gcmd_core::GcmdConfig;
//! use gcmd_concepts::Taxonomy;
//!
//! # async fn run() -> gcmd_core::Result<()> {
//! let taxonomy = Taxonomy::from_config(&GcmdConfig::from_env()).await?;
//! for triple in taxonomy.filter("instruments", "logger", None).await? {
//!     println!("{} {}", triple.id, triple.label);
//! }
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod query;
pub mod resolver;
pub mod taxonomy;

pub use export::{export_documents, ConceptDocument};
pub use resolver::{breadcrumb_title, build_snapshot, HierarchyResolver};
pub use taxonomy::Taxonomy;
