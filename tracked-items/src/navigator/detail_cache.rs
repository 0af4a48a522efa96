//! Per-item detail steps, created lazily from templates.

use std::collections::HashMap;
use tracing::debug;

use crate::catalog::TrackedItem;
use crate::result::TrackedItemAnswer;
use crate::step::{DetailStep, StepInfo, StepPatch, TrackingStep};

/// Detail step templates plus the copies made from them.
///
/// Each item gets at most one copy for the cache's lifetime. Copies are
/// never evicted.
#[derive(Debug, Clone, Default)]
pub struct DetailStepCache {
    templates: Vec<DetailStep>,
    steps: HashMap<String, TrackingStep>,
}

impl DetailStepCache {
    pub fn new(templates: Vec<DetailStep>) -> Self {
        Self {
            templates,
            steps: HashMap::new(),
        }
    }

    pub fn templates(&self) -> &[DetailStep] {
        &self.templates
    }

    /// Replace the templates. Copies made from the old ones are dropped.
    pub fn set_templates(&mut self, templates: Vec<DetailStep>) {
        self.templates = templates;
        self.steps.clear();
    }

    /// Patch the first template. Returns `false` when there are no templates.
    pub fn patch_first_template(&mut self, patch: &StepPatch) -> bool {
        match self.templates.first_mut() {
            Some(template) => {
                patch.apply_to_info(&mut template.info);
                true
            }
            None => false,
        }
    }

    fn template_for(&self, item: &TrackedItem) -> Option<&DetailStep> {
        let details_id = item.add_details_identifier.as_deref()?;
        self.templates.iter().find(|t| t.info.identifier == details_id)
    }

    pub fn has_template(&self, item: &TrackedItem) -> bool {
        self.template_for(item).is_some()
    }

    /// The copy already made for an item, if any.
    pub fn cached(&self, identifier: &str) -> Option<&TrackingStep> {
        self.steps.get(identifier)
    }

    /// Step properties for an item without creating its copy.
    pub fn info_for(&self, item: &TrackedItem) -> Option<&StepInfo> {
        match self.cached(&item.identifier) {
            Some(step) => Some(step.info()),
            None => self.template_for(item).map(|t| &t.info),
        }
    }

    /// The item's detail step with `answer` embedded, creating it on first use.
    pub fn lookup(&mut self, item: &TrackedItem, answer: &TrackedItemAnswer) -> Option<&TrackingStep> {
        if self.steps.contains_key(&item.identifier) {
            let step = self.steps.get_mut(&item.identifier)?;
            if let TrackingStep::Detail(detail) = step {
                detail.update_previous_answer(answer);
            }
            return Some(&*step);
        }

        let copy = self.template_for(item)?.copy_for_item(item, answer);
        debug!(item = %item.identifier, template = ?item.add_details_identifier, "Created detail step");
        let step = self
            .steps
            .entry(item.identifier.clone())
            .or_insert(TrackingStep::Detail(copy));
        Some(&*step)
    }
}
