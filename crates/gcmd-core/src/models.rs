//! Domain models for cached SKOS concept schemes.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

// =============================================================================
// CONCEPTS
// =============================================================================

/// Position of a concept in its scheme's tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreePosition {
    /// No broader concept.
    Root,
    /// Has a broader concept and at least one narrower concept.
    Branch,
    /// Has a broader concept and no narrower concepts.
    Leaf,
}

impl TreePosition {
    /// Classify a concept from its relations. A concept without a broader
    /// reference is a root even when it has no children.
    pub fn classify(broader_id: Option<&str>, narrower_ids: &[String]) -> Self {
        match broader_id {
            None => Self::Root,
            Some(_) if narrower_ids.is_empty() => Self::Leaf,
            Some(_) => Self::Branch,
        }
    }
}

impl fmt::Display for TreePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "root"),
            Self::Branch => write!(f, "branch"),
            Self::Leaf => write!(f, "leaf"),
        }
    }
}

/// One `skos:Concept` as read from a scheme document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptRecord {
    /// `rdf:about` of the concept.
    pub id: String,
    /// English `skos:prefLabel`.
    pub label: String,
    /// English `skos:definition`, empty when absent.
    pub definition: String,
    /// `skos:broader/@rdf:resource`.
    pub broader_id: Option<String>,
    /// `skos:narrower/@rdf:resource`, in document order.
    pub narrower_ids: Vec<String>,
    /// Scheme name taken from `skos:inScheme/@rdf:resource`.
    pub in_scheme: Option<String>,
    pub scheme_name: String,
    pub version: String,
}

/// One step of an ancestor chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ancestor {
    pub id: String,
    pub label: String,
}

/// A concept with its hierarchy position computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConcept {
    #[serde(flatten)]
    pub record: ConceptRecord,
    pub tree_position: TreePosition,
    /// Immediate parent first, topmost ancestor last.
    pub ancestors: Vec<Ancestor>,
    pub breadcrumb_title: String,
    /// Administrative bin for retired terms; hidden from listings.
    pub placeholder: bool,
}

impl ResolvedConcept {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn label(&self) -> &str {
        &self.record.label
    }

    pub fn definition(&self) -> &str {
        &self.record.definition
    }

    pub fn ancestor_ids(&self) -> Vec<&str> {
        self.ancestors.iter().map(|a| a.id.as_str()).collect()
    }

    pub fn triple(&self) -> ConceptTriple {
        ConceptTriple {
            id: self.record.id.clone(),
            label: self.record.label.clone(),
            definition: self.record.definition.clone(),
        }
    }
}

/// `(id, label, definition)` row returned by the query views.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConceptTriple {
    pub id: String,
    pub label: String,
    pub definition: String,
}

/// Relation in which a referenced concept was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityRelation {
    Narrower,
}

/// Recovered data-integrity issue found while resolving a scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataIntegrityWarning {
    pub concept_id: String,
    pub missing_id: String,
    pub relation: IntegrityRelation,
}

// =============================================================================
// SNAPSHOTS
// =============================================================================

/// Fully resolved, immutable view of one scheme at one version.
///
/// Shared as `Arc<SchemeSnapshot>`; a new version produces a new snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemeSnapshot {
    pub scheme_name: String,
    pub version: String,
    /// Concepts in document order.
    pub concepts: Vec<ResolvedConcept>,
    /// Concept id to position in `concepts`.
    pub index: HashMap<String, usize>,
    pub fetched_at: DateTime<Utc>,
    pub warnings: Vec<DataIntegrityWarning>,
}

impl SchemeSnapshot {
    pub fn get(&self, id: &str) -> Option<&ResolvedConcept> {
        self.index.get(id).map(|&i| &self.concepts[i])
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Concepts in document order, administrative placeholder excluded.
    pub fn visible(&self) -> impl Iterator<Item = &ResolvedConcept> {
        self.concepts.iter().filter(|c| !c.placeholder)
    }

    /// Resolvable children of `id`; unresolvable narrower ids are skipped.
    pub fn children(&self, id: &str) -> Vec<&ResolvedConcept> {
        self.get(id)
            .map(|c| {
                c.record
                    .narrower_ids
                    .iter()
                    .filter_map(|child| self.get(child))
                    .collect()
            })
            .unwrap_or_default()
    }
}

// =============================================================================
// CACHE & FETCH OUTCOMES
// =============================================================================

/// Outcome of a cache write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    /// Bytes differed from the stored entry (or none existed) and were persisted.
    Written,
    /// Stored entry already had the same digest; nothing was written.
    Unchanged,
}

impl fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Written => write!(f, "written"),
            Self::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Whether a fetch downloaded the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Fetched,
    /// Remote digest matched the cached copy; no GET was issued.
    Skipped,
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetched => write!(f, "fetched"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Result of fetching one scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    pub scheme: String,
    pub status: FetchStatus,
    pub version: String,
    pub digest: String,
    /// Cache write outcome; `None` when the fetch was skipped.
    pub write: Option<WriteOutcome>,
}

/// Per-scheme outcome of a batch operation.
#[derive(Debug)]
pub struct SchemeOutcome<T> {
    pub scheme: String,
    pub result: Result<T>,
}

impl<T> SchemeOutcome<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, broader: Option<&str>, narrower: &[&str]) -> ConceptRecord {
        ConceptRecord {
            id: id.to_string(),
            label: id.to_uppercase(),
            definition: String::new(),
            broader_id: broader.map(str::to_string),
            narrower_ids: narrower.iter().map(|s| s.to_string()).collect(),
            in_scheme: None,
            scheme_name: "instruments".to_string(),
            version: "8.6".to_string(),
        }
    }

    fn resolved(record: ConceptRecord, placeholder: bool) -> ResolvedConcept {
        ResolvedConcept {
            tree_position: TreePosition::classify(
                record.broader_id.as_deref(),
                &record.narrower_ids,
            ),
            breadcrumb_title: record.label.clone(),
            ancestors: Vec::new(),
            placeholder,
            record,
        }
    }

    #[test]
    fn test_classify_root_leaf_branch() {
        assert_eq!(TreePosition::classify(None, &["a".into()]), TreePosition::Root);
        assert_eq!(TreePosition::classify(None, &[]), TreePosition::Root);
        assert_eq!(TreePosition::classify(Some("p"), &[]), TreePosition::Leaf);
        assert_eq!(
            TreePosition::classify(Some("p"), &["c".into()]),
            TreePosition::Branch
        );
    }

    #[test]
    fn test_tree_position_serde() {
        let json = serde_json::to_string(&TreePosition::Branch).unwrap();
        assert_eq!(json, "\"branch\"");
        assert_eq!(TreePosition::Leaf.to_string(), "leaf");
    }

    #[test]
    fn test_snapshot_lookup_and_children() {
        let concepts = vec![
            resolved(record("a", None, &["b", "ghost"]), false),
            resolved(record("b", Some("a"), &[]), false),
            resolved(record("trash", None, &[]), true),
        ];
        let index = concepts
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id().to_string(), i))
            .collect();
        let snapshot = SchemeSnapshot {
            scheme_name: "instruments".to_string(),
            version: "8.6".to_string(),
            concepts,
            index,
            fetched_at: Utc::now(),
            warnings: Vec::new(),
        };

        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.get("b").map(|c| c.label()), Some("B"));
        assert!(snapshot.get("ghost").is_none());

        let children: Vec<&str> = snapshot.children("a").into_iter().map(|c| c.id()).collect();
        assert_eq!(children, vec!["b"]);

        let visible: Vec<&str> = snapshot.visible().map(|c| c.id()).collect();
        assert_eq!(visible, vec!["a", "b"]);
    }

    #[test]
    fn test_resolved_concept_serializes_flat() {
        let concept = resolved(record("a", None, &[]), false);
        let value = serde_json::to_value(&concept).unwrap();
        assert_eq!(value["id"], "a");
        assert_eq!(value["tree_position"], "root");
        assert!(value.get("record").is_none());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(WriteOutcome::Unchanged.to_string(), "unchanged");
        assert_eq!(FetchStatus::Skipped.to_string(), "skipped");
    }
}
