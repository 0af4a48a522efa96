//! The aggregate result of selected items and their answers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::answer::TrackedItemAnswer;
use super::task::{StepOutcome, StepResult};
use crate::catalog::{TrackedCatalog, TrackedItem};
use crate::error::TrackingError;

/// Selected items and their answers.
///
/// `selected_answers` always holds exactly one answer per selected
/// identifier, in selection order. Deserialization enforces this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "CollectionDocument")]
pub struct TrackedItemsCollectionResult {
    identifier: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    selected_identifiers: Vec<String>,
    selected_answers: Vec<TrackedItemAnswer>,
}

/// Wire shape accepted when decoding a collection result.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CollectionDocument {
    #[serde(default)]
    identifier: String,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    selected_identifiers: Option<Vec<String>>,
    #[serde(default)]
    selected_answers: Vec<TrackedItemAnswer>,
}

impl CollectionDocument {
    /// Answer records present in the document, before missing ones are filled in.
    pub(crate) fn persisted_answers(&self) -> &[TrackedItemAnswer] {
        &self.selected_answers
    }
}

impl TryFrom<CollectionDocument> for TrackedItemsCollectionResult {
    type Error = TrackingError;

    fn try_from(doc: CollectionDocument) -> Result<Self, Self::Error> {
        let identifiers = doc.selected_identifiers.unwrap_or_else(|| {
            doc.selected_answers
                .iter()
                .map(|a| a.identifier.clone())
                .collect()
        });

        let mut seen = HashSet::new();
        for id in &identifiers {
            if !seen.insert(id.as_str()) {
                return Err(TrackingError::InvalidCollection(format!(
                    "duplicate selected identifier `{id}`"
                )));
            }
        }

        let mut by_id: HashMap<String, TrackedItemAnswer> = HashMap::new();
        for answer in doc.selected_answers {
            if !seen.contains(answer.identifier.as_str()) {
                return Err(TrackingError::InvalidCollection(format!(
                    "answer `{}` is not selected",
                    answer.identifier
                )));
            }
            if by_id.contains_key(&answer.identifier) {
                return Err(TrackingError::InvalidCollection(format!(
                    "duplicate answer `{}`",
                    answer.identifier
                )));
            }
            by_id.insert(answer.identifier.clone(), answer);
        }

        let selected_answers = identifiers
            .iter()
            .map(|id| by_id.remove(id).unwrap_or_else(|| TrackedItemAnswer::new(id.clone())))
            .collect();

        let now = Utc::now();
        Ok(Self {
            identifier: doc.identifier,
            start_date: doc.start_date.unwrap_or(now),
            end_date: doc.end_date.unwrap_or(now),
            selected_identifiers: identifiers,
            selected_answers,
        })
    }
}

impl TrackedItemsCollectionResult {
    /// Create an empty result.
    pub fn new(identifier: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            identifier: identifier.into(),
            start_date: now,
            end_date: now,
            selected_identifiers: Vec::new(),
            selected_answers: Vec::new(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    pub fn end_date(&self) -> DateTime<Utc> {
        self.end_date
    }

    /// Copy this result under a different identifier.
    pub fn copy_with(&self, identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..self.clone()
        }
    }

    /// Selected identifiers in selection order.
    pub fn selected_identifiers(&self) -> &[String] {
        &self.selected_identifiers
    }

    /// Answers in selection order.
    pub fn selected_answers(&self) -> &[TrackedItemAnswer] {
        &self.selected_answers
    }

    pub fn is_selected(&self, identifier: &str) -> bool {
        self.selected_identifiers.iter().any(|id| id == identifier)
    }

    /// The answer for a selected item.
    pub fn answer(&self, identifier: &str) -> Option<&TrackedItemAnswer> {
        self.selected_answers.iter().find(|a| a.identifier == identifier)
    }

    fn answer_mut(&mut self, identifier: &str) -> Option<&mut TrackedItemAnswer> {
        self.selected_answers
            .iter_mut()
            .find(|a| a.identifier == identifier)
    }

    /// True iff every selected answer has its required values.
    pub fn has_required_values(&self) -> bool {
        self.selected_answers.iter().all(|a| a.has_required_values())
    }

    /// Replace the selection with `identifiers`, seeding new answers from the catalog defaults.
    pub fn update_selected(&mut self, identifiers: &[String], catalog: &TrackedCatalog) {
        self.update_selected_seeded(identifiers, catalog, TrackedItemAnswer::seeded);
    }

    /// Replace the selection with `identifiers`, using `seed` for newly added items.
    ///
    /// Duplicates and identifiers missing from the catalog are dropped. Answers
    /// of items that stay selected are kept as-is; only their order changes.
    pub fn update_selected_seeded<F>(
        &mut self,
        identifiers: &[String],
        catalog: &TrackedCatalog,
        mut seed: F,
    ) where
        F: FnMut(&TrackedItem) -> TrackedItemAnswer,
    {
        let mut seen = HashSet::new();
        let mut items: Vec<&TrackedItem> = Vec::with_capacity(identifiers.len());
        for id in identifiers {
            if !seen.insert(id.as_str()) {
                continue;
            }
            match catalog.item(id) {
                Some(item) => items.push(item),
                None => debug!(item = %id, "Ignoring selection of unknown item"),
            }
        }

        let mut previous: HashMap<String, TrackedItemAnswer> = self
            .selected_answers
            .drain(..)
            .map(|a| (a.identifier.clone(), a))
            .collect();

        let mut added = 0usize;
        self.selected_answers = items
            .iter()
            .map(|&item| {
                previous.remove(&item.identifier).unwrap_or_else(|| {
                    added += 1;
                    seed(item)
                })
            })
            .collect();
        self.selected_identifiers = items.iter().map(|i| i.identifier.clone()).collect();
        self.end_date = Utc::now();

        debug!(
            selected = self.selected_identifiers.len(),
            added,
            removed = previous.len(),
            "Updated tracked item selection"
        );
    }

    /// Remove the given identifiers, keeping the order of the rest.
    pub fn update_selected_by_removing(&mut self, identifiers: &[String]) {
        let before = self.selected_identifiers.len();
        self.selected_identifiers.retain(|id| !identifiers.contains(id));
        self.selected_answers
            .retain(|a| !identifiers.contains(&a.identifier));
        self.end_date = Utc::now();
        debug!(
            removed = before - self.selected_identifiers.len(),
            "Removed tracked items from selection"
        );
    }

    /// Merge a detail or logging step result into the matching answers.
    ///
    /// Returns `false` when nothing was applied, which includes a result for
    /// an item that is no longer selected.
    pub fn update_details(&mut self, result: &StepResult) -> bool {
        let applied = match &result.outcome {
            StepOutcome::Details { values } => match self.answer_mut(&result.identifier) {
                Some(answer) => {
                    answer.merge_values(values);
                    true
                }
                None => {
                    debug!(item = %result.identifier, "Details reported for an item that is not selected");
                    false
                }
            },
            StepOutcome::Logging { entries } => {
                let mut any = false;
                for entry in entries {
                    match self.answer_mut(&entry.identifier) {
                        Some(answer) => {
                            answer.merge_values(&entry.values);
                            if entry.logged_date.is_some() {
                                answer.logged_date = entry.logged_date;
                            }
                            any = true;
                        }
                        None => {
                            debug!(item = %entry.identifier, "Logging entry for an item that is not selected")
                        }
                    }
                }
                any
            }
            StepOutcome::Collection(collection) => {
                let mut any = false;
                for other in collection.selected_answers() {
                    if let Some(answer) = self.answer_mut(&other.identifier) {
                        answer.merge_values(&other.values);
                        if other.logged_date.is_some() {
                            answer.logged_date = other.logged_date;
                        }
                        any = true;
                    }
                }
                any
            }
            _ => {
                debug!(step = %result.identifier, "Step result carries no item details");
                false
            }
        };
        if applied {
            self.end_date = Utc::now();
        }
        applied
    }

    /// Re-seed answer requirements from the catalog.
    pub(crate) fn apply_requirements(&mut self, catalog: &TrackedCatalog) {
        for answer in &mut self.selected_answers {
            let item = catalog.item(&answer.identifier);
            answer.apply_requirements(item);
        }
    }
}
