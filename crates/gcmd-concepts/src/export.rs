//! Flat JSON documents for loading concepts into a search index.

use gcmd_core::{defaults, Ancestor, SchemeSnapshot, TreePosition};
use serde::{Deserialize, Serialize};

/// One exported concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub summary: String,
    /// Scheme the concept was listed under.
    pub collection: String,
    pub workspace: String,
    pub version: String,
    pub tree_position: TreePosition,
    pub ancestors: Vec<Ancestor>,
    pub breadcrumb_title: String,
}

/// Documents for every visible concept of `snapshot`, in document order.
pub fn export_documents(snapshot: &SchemeSnapshot) -> Vec<ConceptDocument> {
    snapshot
        .visible()
        .map(|c| ConceptDocument {
            id: c.id().to_string(),
            title: c.label().to_string(),
            summary: c.definition().to_string(),
            collection: snapshot.scheme_name.clone(),
            workspace: defaults::EXPORT_WORKSPACE.to_string(),
            version: snapshot.version.clone(),
            tree_position: c.tree_position,
            ancestors: c.ancestors.clone(),
            breadcrumb_title: c.breadcrumb_title.clone(),
        })
        .collect()
}
