//! Structural acceptance test for candidate scheme documents.
//!
//! Two stages:
//! 1. Textual pre-screen for the SKOS namespace URI (no parsing)
//! 2. Structural parse, requiring at least one `skos:Concept`

use crate::document::{scan, SKOS_NS};

/// Stage at which validation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStage {
    /// Rejected by the textual namespace check.
    Prescreen,
    /// Rejected after a structural parse.
    Structure,
    /// Passed both stages.
    Accepted,
}

/// Result of document validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub valid: bool,
    pub stage: ValidationStage,
    pub reason: Option<String>,
    pub concept_count: usize,
}

impl ValidationResult {
    fn rejected(stage: ValidationStage, reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            stage,
            reason: Some(reason.into()),
            concept_count: 0,
        }
    }

    fn accepted(concept_count: usize) -> Self {
        Self {
            valid: true,
            stage: ValidationStage::Accepted,
            reason: None,
            concept_count,
        }
    }
}

/// Validate a candidate document, reporting where and why it was rejected.
pub fn validate_document(bytes: &[u8]) -> ValidationResult {
    if !contains_marker(bytes, SKOS_NS.as_bytes()) {
        return ValidationResult::rejected(
            ValidationStage::Prescreen,
            "SKOS namespace not declared",
        );
    }

    let doc = match scan(bytes) {
        Ok(doc) => doc,
        Err(reason) => return ValidationResult::rejected(ValidationStage::Structure, reason),
    };

    match doc.concepts.len() {
        0 => ValidationResult::rejected(ValidationStage::Structure, "no skos:Concept element"),
        n => ValidationResult::accepted(n),
    }
}

/// True when `bytes` is an acceptable scheme document. Never fails.
pub fn is_valid(bytes: &[u8]) -> bool {
    validate_document(bytes).valid
}

fn contains_marker(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len() && haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
xmlns:skos="http://www.w3.org/2004/02/skos/core#"><gcmd:keywordVersion xmlns:gcmd="http://gcmd.gsfc.nasa.gov/">DUMMY</gcmd:keywordVersion>
<skos:Concept rdf:about="uuid"></skos:Concept></rdf:RDF>"#;

    #[test]
    fn test_valid_document_accepted() {
        let result = validate_document(VALID.as_bytes());
        assert!(result.valid);
        assert_eq!(result.stage, ValidationStage::Accepted);
        assert_eq!(result.concept_count, 1);
        assert!(is_valid(VALID.as_bytes()));
    }

    #[test]
    fn test_missing_namespace_rejected_at_prescreen() {
        // Malformed on purpose: a structural parse would also fail, but the
        // stage shows it never got that far.
        let doc = br#"<concepts xsi:noNamespaceSchemaLocation="http://gcmd.nasa.gov/kms/gcmd.xsd"><unclosed>"#;
        let result = validate_document(doc);
        assert!(!result.valid);
        assert_eq!(result.stage, ValidationStage::Prescreen);
    }

    #[test]
    fn test_namespace_without_concepts_rejected() {
        let doc = br#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
xmlns:skos="http://www.w3.org/2004/02/skos/core#"></rdf:RDF>"#;
        let result = validate_document(doc);
        assert!(!result.valid);
        assert_eq!(result.stage, ValidationStage::Structure);
    }

    #[test]
    fn test_malformed_xml_is_invalid_not_error() {
        let doc = br#"<rdf:RDF xmlns:skos="http://www.w3.org/2004/02/skos/core#"><skos:Concept>"#;
        let result = validate_document(doc);
        assert!(!result.valid);
        assert_eq!(result.stage, ValidationStage::Structure);
    }

    #[test]
    fn test_empty_payload_is_invalid() {
        assert!(!is_valid(b""));
    }
}
