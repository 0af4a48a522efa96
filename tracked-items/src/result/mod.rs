//! Results: per-item answers, the tracked items collection, and the task log.

pub mod answer;
pub mod collection;
pub mod task;

pub use answer::TrackedItemAnswer;
pub use collection::TrackedItemsCollectionResult;
pub use task::{LoggedItem, StepOutcome, StepResult, TaskResult};
