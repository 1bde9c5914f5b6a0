//! # gcmd-core
//!
//! Core types, traits, and abstractions for the GCMD keyword cache.
//!
//! This crate provides the foundational data structures, the SKOS/RDF
//! document handling and the trait definitions that the cache, fetch and
//! concept crates depend on.

pub mod config;
pub mod defaults;
pub mod digest;
pub mod document;
pub mod error;
pub mod logging;
pub mod models;
pub mod registry;
pub mod traits;
pub mod validation;

// Re-export commonly used types at crate root
pub use config::GcmdConfig;
pub use digest::{compute_digest, normalize_remote_digest};
pub use document::{keyword_version, parse_concepts};
pub use error::{Error, Result};
pub use models::*;
pub use registry::{is_known_scheme, list_schemes, ROOT_SCHEME, SCHEMES};
pub use traits::*;
pub use validation::{is_valid, validate_document, ValidationResult, ValidationStage};
