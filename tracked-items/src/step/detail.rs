//! Detail steps collect extra values for a single selected item.

use crate::catalog::TrackedItem;
use crate::result::TrackedItemAnswer;

use super::StepInfo;

/// A detail step template, or a copy of one bound to an item.
///
/// Templates are identified by the `addDetailsIdentifier` items point at.
/// Copies take the item's identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailStep {
    pub info: StepInfo,
    /// The item this copy collects details for; `None` on templates
    pub item: Option<TrackedItem>,
    /// The item's answer as of the last time the step was looked up
    pub previous_answer: Option<TrackedItemAnswer>,
}

impl DetailStep {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self::with_info(StepInfo::new(identifier))
    }

    pub fn with_info(info: StepInfo) -> Self {
        Self {
            info,
            item: None,
            previous_answer: None,
        }
    }

    /// Copy this template for an item.
    pub fn copy_for_item(&self, item: &TrackedItem, answer: &TrackedItemAnswer) -> Self {
        let mut info = self.info.clone();
        info.identifier = item.identifier.clone();
        if info.title.is_none() {
            info.title = item.title.clone();
        }
        Self {
            info,
            item: Some(item.clone()),
            previous_answer: Some(answer.clone()),
        }
    }

    pub fn update_previous_answer(&mut self, answer: &TrackedItemAnswer) {
        self.previous_answer = Some(answer.clone());
    }

    /// Whether this is an unbound template.
    pub fn is_template(&self) -> bool {
        self.item.is_none()
    }
}
