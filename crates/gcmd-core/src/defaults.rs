//! Centralized default constants for the keyword cache.
//!
//! All crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// KEYWORD MANAGEMENT SERVICE
// =============================================================================

/// Default KMS host.
pub const KMS_BASE_URL: &str = "https://gcmdservices.gsfc.nasa.gov";

/// Path prefix of the concept endpoints, relative to the base URL.
pub const CONCEPTS_PATH: &str = "/kms/concepts/";

/// Path segment for per-scheme documents below [`CONCEPTS_PATH`].
pub const CONCEPT_SCHEME_SEGMENT: &str = "concept_scheme/";

/// Query string requesting the RDF/XML representation.
pub const RDF_FORMAT_QUERY: &str = "?format=rdf";

/// Keyword version assumed before any document has been fetched.
pub const KEYWORD_VERSION: &str = "Jun122012";

// =============================================================================
// CACHE
// =============================================================================

/// Cache directory name below `$HOME` when `GCMD_CACHE` is unset.
pub const CACHE_DIR_NAME: &str = ".gcmd";

/// Read buffer size used when hashing cached files.
pub const DIGEST_BUFFER_BYTES: usize = 64 * 1024;

// =============================================================================
// TRANSPORT
// =============================================================================

/// Timeout for a single GET or HEAD request in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 60;

/// Number of schemes fetched concurrently by `fetch_all`.
pub const FETCH_CONCURRENCY: usize = 4;

// =============================================================================
// QUERY
// =============================================================================

/// Default number of matches returned by a filter query.
pub const FILTER_LIMIT: usize = 100;

/// Labels of the administrative placeholder root that collects retired terms.
pub const PLACEHOLDER_LABELS: &[&str] = &["Trash", "Trash Can"];

/// Scheme name of the retired-terms bin as it appears in `skos:inScheme`.
pub const PLACEHOLDER_SCHEME: &str = "Trash";

// =============================================================================
// EXPORT
// =============================================================================

/// Workspace tag written into exported concept documents.
pub const EXPORT_WORKSPACE: &str = "gcmd";
