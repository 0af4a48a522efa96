//! Per-item answers collected while logging tracked items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::TrackedItem;

/// The value record for one selected item.
///
/// Serializes as a flat object: `identifier`, an optional `loggedDate`, and
/// whatever fields the item's detail step collects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedItemAnswer {
    /// Identifier of the item this answer belongs to
    pub identifier: String,
    /// When the item was last logged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logged_date: Option<DateTime<Utc>>,
    /// Collected values
    #[serde(flatten)]
    pub values: Map<String, Value>,
    /// Fields that must be non-null for the answer to be complete.
    /// Seeded from the catalog, never persisted.
    #[serde(skip)]
    required_fields: Vec<String>,
}

impl TrackedItemAnswer {
    /// Create an empty answer with no requirements.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            logged_date: None,
            values: Map::new(),
            required_fields: Vec::new(),
        }
    }

    /// Create a fresh answer seeded from the catalog item's defaults.
    pub fn seeded(item: &TrackedItem) -> Self {
        Self {
            identifier: item.identifier.clone(),
            logged_date: None,
            values: item.default_answer.clone().unwrap_or_default(),
            required_fields: item.required_fields.clone(),
        }
    }

    /// Builder: set a value.
    pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    /// Re-apply the catalog requirements for this answer's item.
    pub(crate) fn apply_requirements(&mut self, item: Option<&TrackedItem>) {
        self.required_fields = item.map(|i| i.required_fields.clone()).unwrap_or_default();
    }

    /// Fields required for completion.
    pub fn required_fields(&self) -> &[String] {
        &self.required_fields
    }

    /// True when every required field is present and not null.
    pub fn has_required_values(&self) -> bool {
        self.required_fields
            .iter()
            .all(|f| self.values.get(f).is_some_and(|v| !v.is_null()))
    }

    /// Merge values reported by a detail or logging step.
    ///
    /// An explicit `null` clears a previously entered value.
    pub fn merge_values(&mut self, values: &Map<String, Value>) {
        for (key, value) in values {
            if value.is_null() {
                self.values.remove(key);
            } else {
                self.values.insert(key.clone(), value.clone());
            }
        }
    }
}
