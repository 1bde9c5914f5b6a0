//! Structured logging schema and field name constants.
//!
//! All crates use these names for structured `tracing` fields so that log
//! aggregation can query fetch and resolve events uniformly. Spans declare the
//! late-bound fields as `tracing::field::Empty` and fill them in with
//! `Span::record(FIELD, value)`.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | A scheme could not be fetched or resolved |
//! | WARN  | Data-integrity issue recovered locally (dangling narrower) |
//! | INFO  | Cache writes, fetch outcomes, snapshot builds |
//! | DEBUG | Decision points (skip vs. fetch, cache hit vs. miss) |
//! | TRACE | Per-concept iteration |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "cache", "fetch", "concepts"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "disk_store", "fetcher", "http", "resolver"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "fetch_scheme", "write", "resolve"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Scheme name being operated on.
pub const SCHEME: &str = "scheme";

/// Keyword version tag.
pub const VERSION: &str = "version";

/// Concept identifier.
pub const CONCEPT_ID: &str = "concept_id";

/// Remote URI.
pub const URI: &str = "uri";

// ─── Measurement fields ────────────────────────────────────────────────────

/// SHA-256 digest of a payload.
pub const DIGEST: &str = "digest";

/// Number of concepts in a snapshot.
pub const CONCEPT_COUNT: &str = "concept_count";

/// Payload size in bytes.
pub const BYTES: &str = "bytes";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Fetch outcome ("fetched", "skipped").
pub const FETCH_STATUS: &str = "fetch_status";

/// Write outcome ("written", "unchanged").
pub const WRITE_OUTCOME: &str = "write_outcome";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
