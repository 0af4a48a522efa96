//! Selection, review and logging steps: steps that display the item list.

use crate::catalog::{TrackedCatalog, TrackedItem, TrackedSection};
use crate::result::TrackedItemsCollectionResult;

use super::StepInfo;

/// A step that lists the catalog items together with the current selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemsStep {
    pub info: StepInfo,
    /// Items shown by the step
    pub items: Vec<TrackedItem>,
    /// Sections used to group the items
    pub sections: Option<Vec<TrackedSection>>,
    /// Snapshot of the tracked items result at the time the step was shown
    pub result: Option<TrackedItemsCollectionResult>,
}

impl ItemsStep {
    pub fn new(identifier: impl Into<String>, catalog: &TrackedCatalog) -> Self {
        Self::with_info(StepInfo::new(identifier), catalog)
    }

    pub fn with_info(info: StepInfo, catalog: &TrackedCatalog) -> Self {
        Self {
            info,
            items: catalog.items().to_vec(),
            sections: catalog.sections().map(|s| s.to_vec()),
            result: None,
        }
    }

    /// Replace the displayed items and sections.
    pub fn set_catalog(&mut self, catalog: &TrackedCatalog) {
        self.items = catalog.items().to_vec();
        self.sections = catalog.sections().map(|s| s.to_vec());
    }
}
