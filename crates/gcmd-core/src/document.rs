//! SKOS/RDF document parsing.
//!
//! KMS scheme documents are RDF/XML with one `skos:Concept` element per
//! concept and a `gcmd:keywordVersion` element carrying the version tag.
//! Documents are read in one streaming pass with namespace resolution; only
//! the direct children of a concept contribute to its record.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use tracing::trace;

use crate::error::{Error, Result};
use crate::models::ConceptRecord;

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const SKOS_NS: &str = "http://www.w3.org/2004/02/skos/core#";
pub const GCMD_NS: &str = "http://gcmd.gsfc.nasa.gov/";

const SCHEME_URI_MARKER: &str = "/concept_scheme/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vocab {
    Rdf,
    Skos,
    Gcmd,
    Other,
}

impl Vocab {
    fn of(ns: &ResolveResult<'_>) -> Self {
        match ns {
            ResolveResult::Bound(Namespace(uri)) if *uri == RDF_NS.as_bytes() => Self::Rdf,
            ResolveResult::Bound(Namespace(uri)) if *uri == SKOS_NS.as_bytes() => Self::Skos,
            ResolveResult::Bound(Namespace(uri)) if *uri == GCMD_NS.as_bytes() => Self::Gcmd,
            _ => Self::Other,
        }
    }
}

#[derive(Debug)]
struct LangText {
    lang: Option<String>,
    text: String,
}

/// Concept fields exactly as found, before any structural checks.
#[derive(Debug, Default)]
pub(crate) struct RawConcept {
    about: Option<String>,
    labels: Vec<LangText>,
    definitions: Vec<LangText>,
    broader: Vec<String>,
    narrower: Vec<String>,
    in_scheme: Vec<String>,
}

impl RawConcept {
    fn into_record(self, scheme_name: &str, version: &str) -> Result<ConceptRecord> {
        let id = self
            .about
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::invalid_document(scheme_name, "skos:Concept without rdf:about"))?;

        if self.broader.len() > 1 {
            return Err(Error::invalid_document(
                scheme_name,
                format!("concept {} has {} broader concepts", id, self.broader.len()),
            ));
        }

        Ok(ConceptRecord {
            label: english_text(&self.labels).unwrap_or_default(),
            definition: english_text(&self.definitions).unwrap_or_default(),
            broader_id: self.broader.into_iter().next(),
            narrower_ids: self.narrower,
            in_scheme: self.in_scheme.first().map(|uri| scheme_name_from_uri(uri)),
            scheme_name: scheme_name.to_string(),
            version: version.to_string(),
            id,
        })
    }
}

/// Everything one pass over a document yields.
#[derive(Debug, Default)]
pub(crate) struct ScannedDocument {
    pub(crate) concepts: Vec<RawConcept>,
    pub(crate) keyword_version: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum TextField {
    Label,
    Definition,
    Version,
}

#[derive(Debug)]
struct Capture {
    field: TextField,
    lang: Option<String>,
    depth: usize,
    text: String,
}

#[derive(Default)]
struct Scanner {
    doc: ScannedDocument,
    concept: Option<(usize, RawConcept)>,
    capture: Option<Capture>,
}

impl Scanner {
    fn open(
        &mut self,
        reader: &NsReader<&[u8]>,
        vocab: Vocab,
        element: &BytesStart<'_>,
        depth: usize,
    ) -> std::result::Result<(), String> {
        let local = element.local_name();
        match (vocab, local.as_ref()) {
            (Vocab::Skos, b"Concept") if self.concept.is_none() => {
                let concept = RawConcept {
                    about: rdf_attribute(reader, element, "about")?,
                    ..RawConcept::default()
                };
                self.concept = Some((depth, concept));
            }
            (Vocab::Gcmd, b"keywordVersion") if self.doc.keyword_version.is_none() => {
                self.begin_capture(TextField::Version, None, depth);
            }
            (Vocab::Skos, name) => {
                let Some(concept_depth) = self.concept.as_ref().map(|(d, _)| *d) else {
                    return Ok(());
                };
                if depth != concept_depth + 1 {
                    return Ok(());
                }
                match name {
                    b"prefLabel" => {
                        self.begin_capture(TextField::Label, lang_attribute(element)?, depth)
                    }
                    b"definition" => {
                        self.begin_capture(TextField::Definition, lang_attribute(element)?, depth)
                    }
                    b"broader" | b"narrower" | b"inScheme" => {
                        let resource = rdf_attribute(reader, element, "resource")?
                            .filter(|r| !r.is_empty());
                        if let (Some(resource), Some((_, concept))) =
                            (resource, self.concept.as_mut())
                        {
                            match name {
                                b"broader" => concept.broader.push(resource),
                                b"narrower" => concept.narrower.push(resource),
                                _ => concept.in_scheme.push(resource),
                            }
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn begin_capture(&mut self, field: TextField, lang: Option<String>, depth: usize) {
        self.capture = Some(Capture {
            field,
            lang,
            depth,
            text: String::new(),
        });
    }

    fn text(&mut self, text: &str) {
        if let Some(capture) = self.capture.as_mut() {
            capture.text.push_str(text);
        }
    }

    fn close(&mut self, depth: usize) {
        if matches!(&self.capture, Some(c) if c.depth == depth) {
            if let Some(capture) = self.capture.take() {
                self.finish_capture(capture);
            }
        }
        if matches!(&self.concept, Some((d, _)) if *d == depth) {
            if let Some((_, concept)) = self.concept.take() {
                self.doc.concepts.push(concept);
            }
        }
    }

    fn finish_capture(&mut self, capture: Capture) {
        let text = capture.text.trim().to_string();
        match capture.field {
            TextField::Version => {
                if !text.is_empty() {
                    self.doc.keyword_version = Some(text);
                }
            }
            TextField::Label | TextField::Definition => {
                if let Some((_, concept)) = self.concept.as_mut() {
                    let entry = LangText {
                        lang: capture.lang,
                        text,
                    };
                    match capture.field {
                        TextField::Label => concept.labels.push(entry),
                        _ => concept.definitions.push(entry),
                    }
                }
            }
        }
    }
}

/// Read a whole document in one pass.
///
/// The error is a human-readable reason; callers wrap it in their own error.
pub(crate) fn scan(bytes: &[u8]) -> std::result::Result<ScannedDocument, String> {
    let text = std::str::from_utf8(bytes).map_err(|e| e.to_string())?;
    let mut reader = NsReader::from_str(text);
    let mut scanner = Scanner::default();
    let mut depth = 0usize;

    loop {
        let (vocab, event) = match reader.read_resolved_event() {
            Ok((ns, event)) => (Vocab::of(&ns), event),
            Err(e) => return Err(e.to_string()),
        };

        match event {
            Event::Start(element) => {
                depth += 1;
                scanner.open(&reader, vocab, &element, depth)?;
            }
            Event::Empty(element) => {
                scanner.open(&reader, vocab, &element, depth + 1)?;
                scanner.close(depth + 1);
            }
            Event::End(_) => {
                scanner.close(depth);
                depth = depth.saturating_sub(1);
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| e.to_string())?;
                scanner.text(&text);
            }
            Event::CData(data) => {
                scanner.text(&String::from_utf8_lossy(&data.into_inner()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth > 0 {
        return Err(format!("unexpected end of document with {} open elements", depth));
    }
    Ok(scanner.doc)
}

/// Extract every `skos:Concept` of a scheme document, in document order.
///
/// A concept without `rdf:about` or with more than one `skos:broader` makes
/// the whole document invalid.
pub fn parse_concepts(
    scheme_name: &str,
    version: &str,
    bytes: &[u8],
) -> Result<Vec<ConceptRecord>> {
    let doc = scan(bytes).map_err(|reason| Error::invalid_document(scheme_name, reason))?;

    let mut records = Vec::with_capacity(doc.concepts.len());
    for raw in doc.concepts {
        let record = raw.into_record(scheme_name, version)?;
        trace!(concept_id = %record.id, label = %record.label, "Parsed concept");
        records.push(record);
    }
    Ok(records)
}

/// The `gcmd:keywordVersion` embedded in a document, if any.
pub fn keyword_version(bytes: &[u8]) -> Option<String> {
    scan(bytes).ok()?.keyword_version
}

/// Scheme name from an `inScheme` URI such as
/// `https://gcmdservices.gsfc.nasa.gov/kms/concepts/concept_scheme/instruments`.
pub fn scheme_name_from_uri(uri: &str) -> String {
    let tail = uri.rsplit(SCHEME_URI_MARKER).next().unwrap_or(uri);
    let tail = tail.split(['?', '#']).next().unwrap_or(tail);
    tail.trim_end_matches('/').to_string()
}

/// Value of the `rdf:`-namespaced attribute `local`.
fn rdf_attribute(
    reader: &NsReader<&[u8]>,
    element: &BytesStart<'_>,
    local: &str,
) -> std::result::Result<Option<String>, String> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let (ns, name) = reader.resolve_attribute(attr.key);
        if Vocab::of(&ns) == Vocab::Rdf && name.as_ref() == local.as_bytes() {
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// `xml:lang`; the `xml` prefix is reserved and never rebound.
fn lang_attribute(element: &BytesStart<'_>) -> std::result::Result<Option<String>, String> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        if attr.key.as_ref() == b"xml:lang" {
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// English text; an untagged entry is the fallback.
fn english_text(entries: &[LangText]) -> Option<String> {
    entries
        .iter()
        .find(|e| e.lang.as_deref() == Some("en"))
        .or_else(|| entries.iter().find(|e| e.lang.is_none()))
        .map(|e| e.text.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:skos="http://www.w3.org/2004/02/skos/core#"
         xmlns:gcmd="http://gcmd.gsfc.nasa.gov/">
  <gcmd:keywordVersion>8.6</gcmd:keywordVersion>
  <skos:Concept rdf:about="parent">
    <skos:prefLabel xml:lang="fr">Instruments (fr)</skos:prefLabel>
    <skos:prefLabel xml:lang="en">Instruments</skos:prefLabel>
    <skos:definition xml:lang="en">  Devices used to take measurements.  </skos:definition>
    <skos:inScheme rdf:resource="https://gcmdservices.gsfc.nasa.gov/kms/concepts/concept_scheme/instruments"/>
    <skos:narrower rdf:resource="child"/>
  </skos:Concept>
  <skos:Concept rdf:about="child">
    <skos:prefLabel>Recorders/Loggers</skos:prefLabel>
    <skos:broader rdf:resource="parent"/>
  </skos:Concept>
</rdf:RDF>"#;

    #[test]
    fn test_parse_concepts_reads_fields() {
        let records = parse_concepts("instruments", "8.6", DOC.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);

        let parent = &records[0];
        assert_eq!(parent.id, "parent");
        assert_eq!(parent.label, "Instruments");
        assert_eq!(parent.definition, "Devices used to take measurements.");
        assert_eq!(parent.broader_id, None);
        assert_eq!(parent.narrower_ids, vec!["child".to_string()]);
        assert_eq!(parent.in_scheme.as_deref(), Some("instruments"));
        assert_eq!(parent.version, "8.6");

        let child = &records[1];
        assert_eq!(child.label, "Recorders/Loggers");
        assert_eq!(child.definition, "");
        assert_eq!(child.broader_id.as_deref(), Some("parent"));
        assert!(child.narrower_ids.is_empty());
    }

    #[test]
    fn test_parse_rejects_multiple_broader() {
        let doc = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
            xmlns:skos="http://www.w3.org/2004/02/skos/core#">
            <skos:Concept rdf:about="x">
              <skos:broader rdf:resource="a"/>
              <skos:broader rdf:resource="b"/>
            </skos:Concept></rdf:RDF>"#;
        let err = parse_concepts("platforms", "8.6", doc.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidDocument { .. }));
    }

    #[test]
    fn test_parse_rejects_concept_without_about() {
        let doc = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
            xmlns:skos="http://www.w3.org/2004/02/skos/core#">
            <skos:Concept><skos:prefLabel>Nameless</skos:prefLabel></skos:Concept></rdf:RDF>"#;
        assert!(parse_concepts("platforms", "8.6", doc.as_bytes()).is_err());
    }

    #[test]
    fn test_empty_broader_resource_is_root() {
        let doc = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
            xmlns:skos="http://www.w3.org/2004/02/skos/core#">
            <skos:Concept rdf:about="x"><skos:broader rdf:resource=""/></skos:Concept></rdf:RDF>"#;
        let records = parse_concepts("platforms", "8.6", doc.as_bytes()).unwrap();
        assert_eq!(records[0].broader_id, None);
    }

    #[test]
    fn test_parse_rejects_malformed_xml() {
        let err = parse_concepts("root", "8.6", b"<rdf:RDF><unclosed>").unwrap_err();
        assert!(matches!(err, Error::InvalidDocument { .. }));
    }

    #[test]
    fn test_nested_elements_do_not_leak_into_concept() {
        let doc = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
            xmlns:skos="http://www.w3.org/2004/02/skos/core#">
            <skos:Concept rdf:about="x">
              <skos:prefLabel>Outer &amp; Label</skos:prefLabel>
              <skos:related><skos:prefLabel xml:lang="en">Inner</skos:prefLabel></skos:related>
            </skos:Concept>
            <skos:Concept rdf:about="y"/></rdf:RDF>"#;
        let records = parse_concepts("platforms", "8.6", doc.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].label, "Outer & Label");
        assert_eq!(records[1].id, "y");
    }

    #[test]
    fn test_prefix_is_resolved_by_namespace() {
        let doc = r#"<r:RDF xmlns:r="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
            xmlns:k="http://www.w3.org/2004/02/skos/core#">
            <k:Concept r:about="x"><k:broader r:resource="p"/></k:Concept>
            <k:Concept r:about="p"/></r:RDF>"#;
        let records = parse_concepts("platforms", "8.6", doc.as_bytes()).unwrap();
        assert_eq!(records[0].broader_id.as_deref(), Some("p"));
    }

    #[test]
    fn test_keyword_version() {
        assert_eq!(keyword_version(DOC.as_bytes()).as_deref(), Some("8.6"));
        assert_eq!(keyword_version(b"<a/>"), None);
        assert_eq!(keyword_version(b"not xml"), None);
    }

    #[test]
    fn test_scheme_name_from_uri() {
        assert_eq!(
            scheme_name_from_uri("http://host/kms/concepts/concept_scheme/providers"),
            "providers"
        );
        assert_eq!(
            scheme_name_from_uri("http://host/kms/concepts/concept_scheme/Trash/"),
            "Trash"
        );
        assert_eq!(scheme_name_from_uri("platforms?format=rdf"), "platforms");
    }
}
