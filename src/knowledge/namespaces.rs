//! Namespace IRIs used by knowledge graphs and built-in behaviors.

/// DBpedia resources
pub const RESOURCE: &str = "http://dbpedia.org/resource/";

/// DBpedia ontology
pub const ONTOLOGY: &str = "http://dbpedia.org/ontology/";

pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";

/// Vocabulary for quasi-facts and exercise hints
pub const VOCAB: &str = "urn:drill:";

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";

/// Type literal marking a term-in-sentence quasi-fact
pub const TERM_IN_SENTENCE: &str = "term-in-sentence";
pub const PART_BEFORE_TERM: &str = "urn:drill:part-before-term";
pub const PART_AFTER_TERM: &str = "urn:drill:part-after-term";
pub const TERM: &str = "urn:drill:term";
pub const SIMILAR_TERM: &str = "urn:drill:similar-term";

/// Expand a `prefix:local` name into a full IRI.
///
/// Unknown prefixes and full IRIs are returned unchanged.
pub fn expand(name: &str) -> String {
    let Some((prefix, local)) = name.split_once(':') else {
        return name.to_string();
    };
    let base = match prefix {
        "dbpedia" => RESOURCE,
        "dbpedia-owl" => ONTOLOGY,
        "rdf" => RDF,
        "rdfs" => RDFS,
        "drill" => VOCAB,
        _ => return name.to_string(),
    };
    format!("{}{}", base, local)
}
