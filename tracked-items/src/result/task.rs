//! Task and step results reported by the host as steps complete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::collection::TrackedItemsCollectionResult;

/// The outcome a step reports when it completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StepOutcome {
    /// Items picked on a selection step
    #[serde(rename_all = "camelCase")]
    Selection { selected_identifiers: Vec<String> },
    /// A full selection plus answers, as produced by a review step
    Collection(TrackedItemsCollectionResult),
    /// The participant asked to remove these items
    RemoveItems { items: Vec<String> },
    /// Values entered on a detail step for one item
    Details { values: Map<String, Value> },
    /// Per-item values recorded on a logging step
    Logging { entries: Vec<LoggedItem> },
    /// Any other answer
    Answer { value: Value },
}

/// One item's entry in a logging step outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedItem {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logged_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub values: Map<String, Value>,
}

/// The result of a single completed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    /// Identifier of the step that produced this result
    pub identifier: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Host-reported jump target chosen on this step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_to_identifier: Option<String>,
    pub outcome: StepOutcome,
}

impl StepResult {
    /// Create a result stamped now.
    pub fn new(identifier: impl Into<String>, outcome: StepOutcome) -> Self {
        let now = Utc::now();
        Self {
            identifier: identifier.into(),
            start_date: now,
            end_date: now,
            skip_to_identifier: None,
            outcome,
        }
    }

    /// Builder: jump to the given step next.
    pub fn with_skip_to(mut self, identifier: impl Into<String>) -> Self {
        self.skip_to_identifier = Some(identifier.into());
        self
    }

    /// Selection outcome helper.
    pub fn selection<I, S>(identifier: impl Into<String>, selected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            identifier,
            StepOutcome::Selection {
                selected_identifiers: selected.into_iter().map(Into::into).collect(),
            },
        )
    }

    /// Remove-items outcome helper.
    pub fn remove_items<I, S>(identifier: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            identifier,
            StepOutcome::RemoveItems {
                items: items.into_iter().map(Into::into).collect(),
            },
        )
    }

    pub fn is_remove_items(&self) -> bool {
        matches!(self.outcome, StepOutcome::RemoveItems { .. })
    }
}

/// The result log for one run of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub identifier: String,
    pub task_run_uuid: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Step results in the order the steps were completed
    #[serde(default)]
    pub step_history: Vec<StepResult>,
    /// Results published outside the step history, one per identifier
    #[serde(default)]
    pub async_results: Vec<StepResult>,
}

impl TaskResult {
    /// Start a new task run.
    pub fn new(identifier: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            identifier: identifier.into(),
            task_run_uuid: Uuid::new_v4(),
            start_date: now,
            end_date: now,
            step_history: Vec::new(),
            async_results: Vec::new(),
        }
    }

    /// Record a completed step.
    pub fn append_step_history(&mut self, result: StepResult) {
        self.end_date = result.end_date.max(self.end_date);
        self.step_history.push(result);
    }

    /// Publish a result, replacing any previous one with the same identifier.
    pub fn append_async_result(&mut self, result: StepResult) {
        match self
            .async_results
            .iter_mut()
            .find(|r| r.identifier == result.identifier)
        {
            Some(existing) => *existing = result,
            None => self.async_results.push(result),
        }
    }

    /// The most recent step result with the given identifier.
    pub fn find_result(&self, identifier: &str) -> Option<&StepResult> {
        self.step_history
            .iter()
            .rev()
            .find(|r| r.identifier == identifier)
    }

    /// A published result with the given identifier.
    pub fn find_async_result(&self, identifier: &str) -> Option<&StepResult> {
        self.async_results.iter().find(|r| r.identifier == identifier)
    }
}
