//! Study Config - the study's registry of activities, tasks, schemas and surveys
//!
//! Decodes the app config served for a study and answers lookups by
//! activity identifier:
//!
//! - **Activities**: groups and per-activity display info
//! - **Tasks**: definitions registered from client data or config elements
//! - **Schemas and surveys**: published references
//! - **Prior client data**: persisted results handed to tracked-items navigators
//!
//! The store is an owned value shared by reference; there is no global
//! instance.

pub mod error;
pub mod settings;
pub mod store;
pub mod types;

pub use error::{ConfigError, Result};
pub use settings::{StudyDuration, StudySettings};
pub use store::StudyConfiguration;
pub use types::{
    ActivityGroup, ActivityInfo, ActivityMapping, AppConfig, ReportCategory, ResourceReference,
    SchemaReference, SurveyReference, TaskDefinition, TaskSource,
};
