//! Error types for tracked-items navigation.

use thiserror::Error;

/// Result type for tracked-items operations
pub type Result<T> = std::result::Result<T, TrackingError>;

/// Errors raised while loading a navigator or importing persisted state.
///
/// Runtime navigation never returns these: lookup misses are `None` and
/// logic violations are asserted in debug builds and skipped in release.
#[derive(Error, Debug)]
pub enum TrackingError {
    /// Malformed JSON configuration or result document
    #[error("Failed to decode JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed YAML configuration document
    #[error("Failed to decode YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A role override decoded to a step of the wrong kind
    #[error("Step override for `{role}` has incompatible type `{found}`")]
    TypeMismatch { role: String, found: String },

    /// A typed step override is missing a required field
    #[error("Step override for `{role}` is missing `{field}`")]
    MissingField { role: String, field: String },

    /// Two catalog items share an identifier
    #[error("Duplicate tracked item identifier: {0}")]
    DuplicateItem(String),

    /// A result document violates the selection/answer invariant
    #[error("Invalid collection result: {0}")]
    InvalidCollection(String),

    /// Previously persisted client data could not be imported
    #[error("Invalid prior client data: {0}")]
    InvalidClientData(String),
}
