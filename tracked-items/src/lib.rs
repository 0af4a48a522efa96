//! Tracked Items - step navigation for logging recurring items
//!
//! Drives the multi-step flow a study participant walks through when
//! logging medications, symptoms or triggers:
//!
//! - **Catalog**: the items that can be tracked, grouped into sections
//! - **Steps**: selection, review, per-item details, logging, reminder
//! - **In-memory result**: the live selection and per-item answers
//! - **Navigator**: folds each completed step into the result and picks the next step
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │               TrackedItemsStepNavigator                  │
//! │                                                          │
//! │  ┌───────────┐   ┌──────────────┐   ┌────────────────┐  │
//! │  │  Catalog  │──▶│ Step roles   │──▶│ Detail cache   │  │
//! │  └───────────┘   └──────────────┘   └────────────────┘  │
//! │                         │                    ▲           │
//! │                  ┌──────▼───────────┐        │           │
//! │                  │ In-memory result │────────┘           │
//! │                  └──────────────────┘                    │
//! └──────────────────────────────────────────────────────────┘
//!            ▲                                   │
//!   ClientDataSource                     TaskResult.asyncResults
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod navigator;
pub mod result;
pub mod step;

pub use catalog::{TrackedCatalog, TrackedItem, TrackedSection};
pub use config::TrackedItemsConfig;
pub use error::{Result, TrackingError};
pub use navigator::{
    ClientDataSource, DetailStepCache, InMemoryResult, NavigationDirection, TaskContext,
    TrackedItemsStepNavigator,
};
pub use result::{
    LoggedItem, StepOutcome, StepResult, TaskResult, TrackedItemAnswer,
    TrackedItemsCollectionResult,
};
pub use step::{
    DefaultStepBuilder, DetailStep, DetailedStepBuilder, ItemsStep, ReminderStep, SkipRule,
    StepDefinition, StepInfo, StepOverride, StepPatch, StepRole, StepTemplateBuilder,
    TrackingStep,
};
