//! The in-memory result: live selection and answers for one navigator.

use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::catalog::TrackedCatalog;
use crate::error::{Result, TrackingError};
use crate::result::collection::CollectionDocument;
use crate::result::{StepResult, TrackedItemAnswer, TrackedItemsCollectionResult};

/// Owns the navigator's collection result and the answers imported from
/// prior client data.
///
/// The collection is created on first access.
#[derive(Debug, Clone)]
pub struct InMemoryResult {
    identifier: String,
    result: Option<TrackedItemsCollectionResult>,
    prior_answers: HashMap<String, TrackedItemAnswer>,
}

impl InMemoryResult {
    /// `identifier` names the collection when it is first created.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            result: None,
            prior_answers: HashMap::new(),
        }
    }

    /// The result, if it has been created.
    pub fn peek(&self) -> Option<&TrackedItemsCollectionResult> {
        self.result.as_ref()
    }

    pub fn get_mut(&mut self) -> &mut TrackedItemsCollectionResult {
        let identifier = &self.identifier;
        self.result
            .get_or_insert_with(|| TrackedItemsCollectionResult::new(identifier.clone()))
    }

    pub fn has_selection(&self) -> bool {
        self.peek()
            .is_some_and(|r| !r.selected_identifiers().is_empty())
    }

    pub fn has_required_values(&self) -> bool {
        self.peek().map_or(true, |r| r.has_required_values())
    }

    /// Replace the selection. New items are seeded from prior data when
    /// available, otherwise from catalog defaults.
    pub fn update_selected(&mut self, identifiers: &[String], catalog: &TrackedCatalog) {
        let prior = &self.prior_answers;
        let identifier = &self.identifier;
        let result = self
            .result
            .get_or_insert_with(|| TrackedItemsCollectionResult::new(identifier.clone()));
        result.update_selected_seeded(identifiers, catalog, |item| match prior.get(&item.identifier) {
            Some(answer) => {
                let mut answer = answer.clone();
                answer.apply_requirements(Some(item));
                answer
            }
            None => TrackedItemAnswer::seeded(item),
        });
    }

    pub fn update_selected_by_removing(&mut self, identifiers: &[String]) {
        self.get_mut().update_selected_by_removing(identifiers);
    }

    pub fn update_details(&mut self, result: &StepResult) {
        if !self.get_mut().update_details(result) {
            debug!(step = %result.identifier, "No tracked item details applied");
        }
    }

    /// Replace the whole result, as reported by a review step.
    pub fn replace(&mut self, mut result: TrackedItemsCollectionResult, catalog: &TrackedCatalog) {
        result.apply_requirements(catalog);
        self.result = Some(result);
    }

    /// Re-seed answer requirements after the catalog changed.
    pub fn refresh_requirements(&mut self, catalog: &TrackedCatalog) {
        if let Some(result) = self.result.as_mut() {
            result.apply_requirements(catalog);
        }
    }

    /// Import previously persisted selections and answers.
    ///
    /// Accepts a persisted collection object or a bare array of answers.
    /// On error the current state is left untouched.
    pub fn import_client_data(&mut self, data: &Value, catalog: &TrackedCatalog) -> Result<()> {
        let (identifiers, answers): (Vec<String>, Vec<TrackedItemAnswer>) = match data {
            Value::Object(_) => {
                let document: CollectionDocument = serde_json::from_value(data.clone())
                    .map_err(|e| TrackingError::InvalidClientData(e.to_string()))?;
                let answers = document.persisted_answers().to_vec();
                let collection = TrackedItemsCollectionResult::try_from(document)
                    .map_err(|e| TrackingError::InvalidClientData(e.to_string()))?;
                (collection.selected_identifiers().to_vec(), answers)
            }
            Value::Array(_) => {
                let answers: Vec<TrackedItemAnswer> = serde_json::from_value(data.clone())
                    .map_err(|e| TrackingError::InvalidClientData(e.to_string()))?;
                (answers.iter().map(|a| a.identifier.clone()).collect(), answers)
            }
            other => {
                return Err(TrackingError::InvalidClientData(format!(
                    "expected an object or array, found {other}"
                )))
            }
        };

        for id in identifiers.iter().filter(|id| !catalog.contains(id)) {
            warn!(item = %id, "Prior client data references an item missing from the catalog");
        }

        // Selected items without a persisted record fall back to catalog defaults.
        self.prior_answers = answers
            .into_iter()
            .map(|a| (a.identifier.clone(), a))
            .collect();
        self.result = Some(TrackedItemsCollectionResult::new(self.identifier.clone()));
        self.update_selected(&identifiers, catalog);

        debug!(
            selected = self.peek().map_or(0, |r| r.selected_identifiers().len()),
            "Imported prior client data"
        );
        Ok(())
    }
}
