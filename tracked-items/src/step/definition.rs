//! Decoding host-supplied step overrides.
//!
//! An override either carries a `type` discriminator and fully replaces the
//! default step for its role, or is a partial patch applied on top of it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::TrackedCatalog;
use crate::error::{Result, TrackingError};

use super::{DetailStep, ItemsStep, ReminderStep, SkipRule, StepInfo, StepRole, TrackingStep};

/// A complete step definition identified by its `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StepDefinition {
    /// A step listing the tracked items (selection, review or logging)
    #[serde(alias = "selection", alias = "review", alias = "logging")]
    TrackedItems(StepInfo),
    /// A detail template
    #[serde(alias = "details")]
    TrackedItemDetails(StepInfo),
    /// A reminder step
    #[serde(alias = "reminder")]
    TrackedItemReminders(ReminderDefinition),
}

/// Reminder fields on top of the shared step info.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderDefinition {
    #[serde(flatten)]
    pub info: StepInfo,
    #[serde(default)]
    pub reminder_choices: Vec<u32>,
}

impl StepDefinition {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::TrackedItems(_) => "trackedItems",
            Self::TrackedItemDetails(_) => "trackedItemDetails",
            Self::TrackedItemReminders(_) => "trackedItemReminders",
        }
    }

    /// Build the replacement for a selection, review or logging step.
    pub fn into_items_step(self, role: StepRole, catalog: &TrackedCatalog) -> Result<ItemsStep> {
        match self {
            Self::TrackedItems(mut info) => {
                if info.identifier.is_empty() {
                    info.identifier = role.as_str().to_string();
                }
                Ok(ItemsStep::with_info(info, catalog))
            }
            other => Err(mismatch(role, &other)),
        }
    }

    /// Build a detail template. Templates must name themselves.
    pub fn into_detail_step(self) -> Result<DetailStep> {
        match self {
            Self::TrackedItemDetails(info) => {
                if info.identifier.is_empty() {
                    return Err(TrackingError::MissingField {
                        role: StepRole::AddDetails.as_str().to_string(),
                        field: "identifier".to_string(),
                    });
                }
                Ok(DetailStep::with_info(info))
            }
            other => Err(mismatch(StepRole::AddDetails, &other)),
        }
    }

    /// Build the replacement reminder step.
    pub fn into_reminder_step(self) -> Result<ReminderStep> {
        match self {
            Self::TrackedItemReminders(def) => {
                let mut info = def.info;
                if info.identifier.is_empty() {
                    info.identifier = StepRole::Reminder.as_str().to_string();
                }
                Ok(ReminderStep {
                    info,
                    reminder_choices: def.reminder_choices,
                })
            }
            other => Err(mismatch(StepRole::Reminder, &other)),
        }
    }
}

fn mismatch(role: StepRole, found: &StepDefinition) -> TrackingError {
    TrackingError::TypeMismatch {
        role: role.as_str().to_string(),
        found: found.type_name().to_string(),
    }
}

/// Partial replacement of a default step's properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepPatch {
    pub title: Option<String>,
    pub detail: Option<String>,
    pub next_step_identifier: Option<String>,
    pub skip_rule: Option<SkipRule>,
    pub reminder_choices: Option<Vec<u32>>,
}

impl StepPatch {
    /// Overwrite the properties present in the patch.
    pub fn apply_to(&self, step: &mut TrackingStep) {
        self.apply_to_info(step.info_mut());
        if let (TrackingStep::Reminder(reminder), Some(choices)) = (step, &self.reminder_choices) {
            reminder.reminder_choices = choices.clone();
        }
    }

    /// Overwrite the shared step properties present in the patch.
    pub fn apply_to_info(&self, info: &mut StepInfo) {
        if let Some(title) = &self.title {
            info.title = Some(title.clone());
        }
        if let Some(detail) = &self.detail {
            info.detail = Some(detail.clone());
        }
        if let Some(next) = &self.next_step_identifier {
            info.next_step_identifier = Some(next.clone());
        }
        if let Some(rule) = self.skip_rule {
            info.skip_rule = rule;
        }
    }
}

/// A role override as found in a configuration document.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOverride {
    Definition(StepDefinition),
    Patch(StepPatch),
}

impl StepOverride {
    /// Decode an override, choosing the form by the presence of `type`.
    pub fn from_value(value: Value) -> Result<Self> {
        if value.get("type").is_some() {
            Ok(Self::Definition(serde_json::from_value(value)?))
        } else {
            Ok(Self::Patch(serde_json::from_value(value)?))
        }
    }
}
