//! Read-only listings over a resolved [`SchemeSnapshot`].
//!
//! Every view derives from the same base listing of concepts in document
//! order with the administrative placeholder removed. Nothing here does I/O.

use std::collections::BTreeSet;
use std::ops::Range;

use gcmd_core::{defaults, ConceptTriple, SchemeSnapshot, ROOT_SCHEME};
use once_cell::sync::Lazy;
use regex::Regex;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("valid regex"));

/// `(id, label, definition)` for every visible concept, in document order.
pub fn triples(snapshot: &SchemeSnapshot) -> Vec<ConceptTriple> {
    snapshot.visible().map(|c| c.triple()).collect()
}

/// `(id, label)` pairs.
pub fn tuples(snapshot: &SchemeSnapshot) -> Vec<(String, String)> {
    snapshot
        .visible()
        .map(|c| (c.id().to_string(), c.label().to_string()))
        .collect()
}

pub fn names(snapshot: &SchemeSnapshot) -> Vec<String> {
    snapshot.visible().map(|c| c.label().to_string()).collect()
}

/// Triples sorted by id.
pub fn sorted_triples(snapshot: &SchemeSnapshot) -> Vec<ConceptTriple> {
    let mut triples = triples(snapshot);
    triples.sort_by(|a, b| a.id.cmp(&b.id));
    triples
}

/// `(id, label)` of concepts below the top level.
///
/// The root document lists scheme tops only, so all its concepts qualify.
pub fn narrower(snapshot: &SchemeSnapshot) -> Vec<(String, String)> {
    let all = snapshot.scheme_name == ROOT_SCHEME;
    snapshot
        .visible()
        .filter(|c| all || c.record.broader_id.is_some())
        .map(|c| (c.id().to_string(), c.label().to_string()))
        .collect()
}

/// Drop every run of non-word characters and lowercase the rest.
pub fn normalize_query(query: &str) -> String {
    NON_WORD.replace_all(query, "").to_lowercase()
}

/// Triples whose label contains `query`, case-insensitively, sliced to `range`.
///
/// An empty query (after normalization) matches everything. The range is
/// clamped to the number of matches.
pub fn filter(snapshot: &SchemeSnapshot, query: &str, range: Range<usize>) -> Vec<ConceptTriple> {
    let needle = normalize_query(query);
    snapshot
        .visible()
        .filter(|c| needle.is_empty() || c.label().to_lowercase().contains(&needle))
        .skip(range.start)
        .take(range.end.saturating_sub(range.start))
        .map(|c| c.triple())
        .collect()
}

/// Default result window for [`filter`].
pub fn default_range() -> Range<usize> {
    0..defaults::FILTER_LIMIT
}

/// Scheme names referenced through `skos:inScheme`, placeholder scheme excluded.
pub fn discovered_schemes(snapshot: &SchemeSnapshot) -> Vec<String> {
    snapshot
        .concepts
        .iter()
        .filter_map(|c| c.record.in_scheme.as_deref())
        .filter(|s| !s.is_empty() && *s != defaults::PLACEHOLDER_SCHEME)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
