//! Merge rules: defaults, override order, conflict handling.
//!
//! Later sources replace scalar values of earlier ones and merge tables key by
//! key, so a workspace file can override a single component parameter.

pub mod merge_policy;
