//! Error types for the study configuration store.

use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while loading study configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The app config's client data is not a valid activity mapping.
    /// The host should refresh its app config.
    #[error("Failed to decode client data: {0}")]
    ClientData(#[source] serde_json::Error),

    #[error("Failed to decode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to decode YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// No task is registered under the identifier
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    /// A registered task is not a valid tracked-items flow
    #[error("Invalid tracked items task: {0}")]
    Tracking(#[from] tracked_items::TrackingError),
}
