//! Steps shown while tracking items.
//!
//! Every step is one of five roles. Selection, review, logging and reminder
//! steps are singletons per navigator; detail steps are templates copied once
//! per item.

pub mod builder;
pub mod definition;
pub mod detail;
pub mod items;
pub mod reminder;

use serde::{Deserialize, Serialize};

use crate::catalog::TrackedItem;
use crate::result::{TrackedItemAnswer, TrackedItemsCollectionResult};

pub use builder::{DefaultStepBuilder, DetailedStepBuilder, StepTemplateBuilder};
pub use definition::{StepDefinition, StepOverride, StepPatch};
pub use detail::DetailStep;
pub use items::ItemsStep;
pub use reminder::ReminderStep;

/// The role a step plays in the tracking flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepRole {
    Selection,
    Review,
    AddDetails,
    Logging,
    Reminder,
}

impl StepRole {
    /// Default step identifier and configuration key for the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Selection => "selection",
            Self::Review => "review",
            Self::AddDetails => "addDetails",
            Self::Logging => "logging",
            Self::Reminder => "reminder",
        }
    }

    /// All roles in flow order.
    pub fn all() -> [Self; 5] {
        [
            Self::Selection,
            Self::Review,
            Self::AddDetails,
            Self::Logging,
            Self::Reminder,
        ]
    }
}

/// When a step embedded in a parent task should be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipRule {
    /// Always show the step
    #[default]
    Never,
    /// Never show the step
    Always,
    /// Skip while nothing is selected
    NoSelection,
}

impl SkipRule {
    pub fn should_skip(&self, has_selection: bool) -> bool {
        match self {
            Self::Never => false,
            Self::Always => true,
            Self::NoSelection => !has_selection,
        }
    }
}

/// Properties shared by every step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepInfo {
    /// Step identifier
    #[serde(default)]
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Step to jump to when this step completes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step_identifier: Option<String>,
    #[serde(default)]
    pub skip_rule: SkipRule,
}

impl StepInfo {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Default::default()
        }
    }
}

/// A step in the tracking flow.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackingStep {
    Selection(ItemsStep),
    Review(ItemsStep),
    Logging(ItemsStep),
    Detail(DetailStep),
    Reminder(ReminderStep),
}

impl TrackingStep {
    pub fn identifier(&self) -> &str {
        &self.info().identifier
    }

    pub fn role(&self) -> StepRole {
        match self {
            Self::Selection(_) => StepRole::Selection,
            Self::Review(_) => StepRole::Review,
            Self::Logging(_) => StepRole::Logging,
            Self::Detail(_) => StepRole::AddDetails,
            Self::Reminder(_) => StepRole::Reminder,
        }
    }

    pub fn info(&self) -> &StepInfo {
        match self {
            Self::Selection(s) | Self::Review(s) | Self::Logging(s) => &s.info,
            Self::Detail(s) => &s.info,
            Self::Reminder(s) => &s.info,
        }
    }

    pub fn info_mut(&mut self) -> &mut StepInfo {
        match self {
            Self::Selection(s) | Self::Review(s) | Self::Logging(s) => &mut s.info,
            Self::Detail(s) => &mut s.info,
            Self::Reminder(s) => &mut s.info,
        }
    }

    /// Attach the current tracked items result so the step renders it.
    pub fn attach_result(&mut self, result: &TrackedItemsCollectionResult) {
        match self {
            Self::Selection(s) | Self::Review(s) | Self::Logging(s) => {
                s.result = Some(result.clone());
            }
            Self::Detail(s) => {
                if let Some(answer) = result.answer(&s.info.identifier) {
                    s.update_previous_answer(answer);
                }
            }
            Self::Reminder(_) => {}
        }
    }

    /// Copy a detail template for one item. Only detail steps can be copied.
    pub fn copy_for_item(&self, item: &TrackedItem, answer: &TrackedItemAnswer) -> Option<Self> {
        match self {
            Self::Detail(s) => Some(Self::Detail(s.copy_for_item(item, answer))),
            _ => None,
        }
    }

    /// Whether the step's own skip rule applies.
    pub fn should_skip(&self, has_selection: bool) -> bool {
        self.info().skip_rule.should_skip(has_selection)
    }

    /// The attached result for selection, review and logging steps.
    pub fn result(&self) -> Option<&TrackedItemsCollectionResult> {
        match self {
            Self::Selection(s) | Self::Review(s) | Self::Logging(s) => s.result.as_ref(),
            _ => None,
        }
    }

    pub fn as_items(&self) -> Option<&ItemsStep> {
        match self {
            Self::Selection(s) | Self::Review(s) | Self::Logging(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_items_mut(&mut self) -> Option<&mut ItemsStep> {
        match self {
            Self::Selection(s) | Self::Review(s) | Self::Logging(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_detail(&self) -> Option<&DetailStep> {
        match self {
            Self::Detail(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reminder(&self) -> Option<&ReminderStep> {
        match self {
            Self::Reminder(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TrackedCatalog;

    #[test]
    fn test_skip_rules() {
        assert!(!SkipRule::Never.should_skip(false));
        assert!(SkipRule::Always.should_skip(true));
        assert!(SkipRule::NoSelection.should_skip(false));
        assert!(!SkipRule::NoSelection.should_skip(true));
    }

    #[test]
    fn test_only_detail_steps_copy() {
        let catalog = TrackedCatalog::new(vec![TrackedItem::new("a")], None).unwrap();
        let item = &catalog.items()[0];
        let answer = TrackedItemAnswer::seeded(item);

        let selection = TrackingStep::Selection(ItemsStep::new("selection", &catalog));
        assert!(selection.copy_for_item(item, &answer).is_none());

        let template = TrackingStep::Detail(DetailStep::new("medicationDetails"));
        let copy = template.copy_for_item(item, &answer).unwrap();
        assert_eq!(copy.identifier(), "a");
        assert_eq!(copy.role(), StepRole::AddDetails);
    }

    #[test]
    fn test_attach_result_snapshot() {
        let catalog = TrackedCatalog::new(vec![TrackedItem::new("a")], None).unwrap();
        let mut result = TrackedItemsCollectionResult::new("logging");
        result.update_selected(&["a".to_string()], &catalog);

        let mut step = TrackingStep::Review(ItemsStep::new("review", &catalog));
        step.attach_result(&result);
        assert_eq!(step.result().unwrap().selected_identifiers().len(), 1);
    }
}
