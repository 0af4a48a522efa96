//! The catalog of trackable items and their presentation sections.
//!
//! A catalog is immutable once loaded. Sections only group items for display;
//! navigation never consults them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Result, TrackingError};

/// A unit the participant selects and logs recurring data about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedItem {
    /// Unique identifier within the catalog
    pub identifier: String,
    /// Section this item is displayed under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_identifier: Option<String>,
    /// Display title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Display detail text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Identifier of the detail step template used to add details for this item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_details_identifier: Option<String>,
    /// Answer fields that must be filled before the item is complete
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_fields: Vec<String>,
    /// Values seeded into a fresh answer when the item is selected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_answer: Option<serde_json::Map<String, serde_json::Value>>,
}

impl TrackedItem {
    /// Create an item with only an identifier.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            section_identifier: None,
            title: None,
            detail: None,
            add_details_identifier: None,
            required_fields: Vec::new(),
            default_answer: None,
        }
    }

    /// Builder: point the item at a detail step template.
    pub fn with_details(mut self, add_details_identifier: impl Into<String>) -> Self {
        self.add_details_identifier = Some(add_details_identifier.into());
        self
    }

    /// Builder: declare the answer fields required for completion.
    pub fn with_required_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: set the section.
    pub fn with_section(mut self, section_identifier: impl Into<String>) -> Self {
        self.section_identifier = Some(section_identifier.into());
        self
    }

    /// Builder: set the default answer values.
    pub fn with_default_answer(mut self, values: serde_json::Map<String, serde_json::Value>) -> Self {
        self.default_answer = Some(values);
        self
    }
}

/// A presentation grouping of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedSection {
    /// Unique identifier
    pub identifier: String,
    /// Display title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Display detail text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Ordered item identifiers in this section
    #[serde(default)]
    pub items: Vec<String>,
}

impl TrackedSection {
    /// Create an empty section.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: None,
            detail: None,
            items: Vec::new(),
        }
    }
}

/// Items plus their optional sections.
///
/// Item identifiers are unique. Deserialization enforces this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CatalogDocument")]
pub struct TrackedCatalog {
    items: Vec<TrackedItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sections: Option<Vec<TrackedSection>>,
}

#[derive(Deserialize)]
struct CatalogDocument {
    items: Vec<TrackedItem>,
    #[serde(default)]
    sections: Option<Vec<TrackedSection>>,
}

impl TryFrom<CatalogDocument> for TrackedCatalog {
    type Error = TrackingError;

    fn try_from(doc: CatalogDocument) -> Result<Self> {
        Self::new(doc.items, doc.sections)
    }
}

impl TrackedCatalog {
    /// Build a catalog, rejecting duplicate item identifiers.
    pub fn new(items: Vec<TrackedItem>, sections: Option<Vec<TrackedSection>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(item.identifier.as_str()) {
                return Err(TrackingError::DuplicateItem(item.identifier.clone()));
            }
        }
        Ok(Self { items, sections })
    }

    /// All items in catalog order.
    pub fn items(&self) -> &[TrackedItem] {
        &self.items
    }

    /// Sections, if any were supplied.
    pub fn sections(&self) -> Option<&[TrackedSection]> {
        self.sections.as_deref()
    }

    /// Look up an item by identifier.
    pub fn item(&self, identifier: &str) -> Option<&TrackedItem> {
        self.items.iter().find(|i| i.identifier == identifier)
    }

    /// Check whether an identifier names a catalog item.
    pub fn contains(&self, identifier: &str) -> bool {
        self.item(identifier).is_some()
    }

    /// Items belonging to a section, in section order.
    ///
    /// Uses the section's explicit item list when present, otherwise the
    /// items that declare the section.
    pub fn items_in_section(&self, section_identifier: &str) -> Vec<&TrackedItem> {
        let listed = self
            .sections()
            .and_then(|s| s.iter().find(|s| s.identifier == section_identifier))
            .map(|s| s.items.as_slice())
            .unwrap_or(&[]);

        if listed.is_empty() {
            self.items
                .iter()
                .filter(|i| i.section_identifier.as_deref() == Some(section_identifier))
                .collect()
        } else {
            listed.iter().filter_map(|id| self.item(id)).collect()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
