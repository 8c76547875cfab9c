//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::ComponentNotFound(_) | ApiError::ComponentDisabled(_) => {
            format!("{}\n\nUse 'drill components' to list configured components.", e)
        }
        ApiError::BehaviorNotFound { .. } => {
            format!("{}\n\nUse 'drill behaviors' to list installed behaviors.", e)
        }
        _ => e.to_string(),
    }
}
