//! Conversions between term IRIs and human-readable names.

use crate::knowledge::namespaces::RESOURCE;

/// Derive a readable name from a term IRI: last path segment, underscores to spaces.
///
/// Plain names without a slash are returned with the same underscore rule.
pub fn term_to_name(term: &str) -> String {
    term.rsplit('/').next().unwrap_or(term).replace('_', " ")
}

/// Build the resource IRI for a name.
///
/// The first character is upper-cased and spaces become underscores.
pub fn name_to_term(name: &str) -> String {
    let mut chars = name.chars();
    let normalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    format!("{}{}", RESOURCE, normalized.replace(' ', "_"))
}
