//! The optional reminder step.

use super::StepInfo;

/// Lets the participant pick when to be reminded about the tracked items.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderStep {
    pub info: StepInfo,
    /// Offered reminder offsets, in minutes before the scheduled time
    pub reminder_choices: Vec<u32>,
}

impl ReminderStep {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            info: StepInfo::new(identifier),
            reminder_choices: Vec::new(),
        }
    }

    pub fn with_choices(mut self, minutes: impl IntoIterator<Item = u32>) -> Self {
        self.reminder_choices = minutes.into_iter().collect();
        self
    }
}
