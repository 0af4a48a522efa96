//! Default step construction.
//!
//! A navigator builds its steps once from the catalog through a
//! [`StepTemplateBuilder`]. Configuration overrides are applied afterwards.

use std::collections::HashSet;

use crate::catalog::TrackedCatalog;

use super::{DetailStep, ItemsStep, ReminderStep, StepRole};

/// Trait for building the default steps of a tracking flow.
///
/// Every method has a default; implementors override the roles they customize.
pub trait StepTemplateBuilder: Send + Sync {
    /// Build the selection step
    fn build_selection_step(&self, catalog: &TrackedCatalog) -> ItemsStep {
        ItemsStep::new(StepRole::Selection.as_str(), catalog)
    }

    /// Build the review step; flows have none by default
    fn build_review_step(&self, _catalog: &TrackedCatalog) -> Option<ItemsStep> {
        None
    }

    /// Build the detail step templates; flows have none by default
    fn build_detail_steps(&self, _catalog: &TrackedCatalog) -> Vec<DetailStep> {
        Vec::new()
    }

    /// Build the logging step
    fn build_logging_step(&self, catalog: &TrackedCatalog) -> ItemsStep {
        ItemsStep::new(StepRole::Logging.as_str(), catalog)
    }

    /// Build the reminder step; flows have none by default
    fn build_reminder_step(&self) -> Option<ReminderStep> {
        None
    }
}

/// Selection then logging, nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStepBuilder;

impl StepTemplateBuilder for DefaultStepBuilder {}

/// Selection, review, one detail template per distinct `addDetailsIdentifier`
/// in the catalog, logging, and optionally a reminder step.
#[derive(Debug, Clone, Default)]
pub struct DetailedStepBuilder {
    /// Build a reminder step offering these choices (minutes)
    pub reminder_choices: Option<Vec<u32>>,
}

impl DetailedStepBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: include a reminder step.
    pub fn with_reminder(mut self, minutes: impl IntoIterator<Item = u32>) -> Self {
        self.reminder_choices = Some(minutes.into_iter().collect());
        self
    }
}

impl StepTemplateBuilder for DetailedStepBuilder {
    fn build_review_step(&self, catalog: &TrackedCatalog) -> Option<ItemsStep> {
        Some(ItemsStep::new(StepRole::Review.as_str(), catalog))
    }

    fn build_detail_steps(&self, catalog: &TrackedCatalog) -> Vec<DetailStep> {
        let mut seen = HashSet::new();
        catalog
            .items()
            .iter()
            .filter_map(|i| i.add_details_identifier.as_deref())
            .filter(|id| seen.insert(*id))
            .map(DetailStep::new)
            .collect()
    }

    fn build_reminder_step(&self) -> Option<ReminderStep> {
        self.reminder_choices.as_ref().map(|choices| {
            ReminderStep::new(StepRole::Reminder.as_str()).with_choices(choices.iter().copied())
        })
    }
}
