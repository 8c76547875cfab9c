//! Shared primitive types.

/// 32-byte blake3 digest
pub type Hash = [u8; 32];

/// Content-derived identity of an exercise
pub type ExerciseID = Hash;

/// Opaque behavior configuration: a schemaless string-keyed map.
///
/// The framework passes it verbatim to behavior factories and never inspects it.
pub type Parameters = serde_json::Map<String, serde_json::Value>;
