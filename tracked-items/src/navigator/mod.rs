//! Step navigation for a tracked-items task.
//!
//! The navigator folds each completed step's outcome into the in-memory
//! result, then decides which step comes next:
//!
//! ```text
//!  Start ──► Selection ──► Review ──► Detail(item)* ──► Reminder ──► Exit
//!    │           │           ▲   │          │
//!    │           └───────────┼───┼──────────┴──► Logging ──► Exit
//!    └─ prior data ──────────┼───┘                  ▲
//!                            └──────────────────────┘
//! ```
//!
//! A jump target declared by the completed step always wins when it resolves.
//! Without a review step, a finished reminder leads to logging.

mod context;
mod detail_cache;
mod in_memory;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::catalog::{TrackedCatalog, TrackedItem, TrackedSection};
use crate::error::Result;
use crate::result::{
    StepOutcome, StepResult, TaskResult, TrackedItemAnswer, TrackedItemsCollectionResult,
};
use crate::step::{
    DefaultStepBuilder, DetailStep, StepInfo, StepOverride, StepRole, StepTemplateBuilder,
    TrackingStep,
};

pub use context::{ClientDataSource, TaskContext};
pub use detail_cache::DetailStepCache;
pub use in_memory::InMemoryResult;

/// Which way the host should animate a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NavigationDirection {
    #[default]
    Forward,
    Reverse,
}

/// Stateful controller for one run of a tracked-items flow.
///
/// Methods take `&mut self`; calls must complete one at a time.
#[derive(Debug, Clone)]
pub struct TrackedItemsStepNavigator {
    activity_identifier: String,
    catalog: TrackedCatalog,
    selection_step: TrackingStep,
    review_step: Option<TrackingStep>,
    logging_step: TrackingStep,
    reminder_step: Option<TrackingStep>,
    detail_steps: DetailStepCache,
    in_memory: InMemoryResult,
    previous_client_data: Option<Value>,
    task_context: Option<TaskContext>,
}

impl TrackedItemsStepNavigator {
    /// Navigator with a selection and a logging step only.
    pub fn new(activity_identifier: impl Into<String>, catalog: TrackedCatalog) -> Self {
        Self::with_builder(activity_identifier, catalog, &DefaultStepBuilder)
    }

    /// Navigator whose default steps come from `builder`.
    pub fn with_builder(
        activity_identifier: impl Into<String>,
        catalog: TrackedCatalog,
        builder: &dyn StepTemplateBuilder,
    ) -> Self {
        let activity_identifier = activity_identifier.into();
        Self {
            selection_step: TrackingStep::Selection(builder.build_selection_step(&catalog)),
            review_step: builder.build_review_step(&catalog).map(TrackingStep::Review),
            logging_step: TrackingStep::Logging(builder.build_logging_step(&catalog)),
            reminder_step: builder.build_reminder_step().map(TrackingStep::Reminder),
            detail_steps: DetailStepCache::new(builder.build_detail_steps(&catalog)),
            in_memory: InMemoryResult::new(activity_identifier.clone()),
            activity_identifier,
            catalog,
            previous_client_data: None,
            task_context: None,
        }
    }

    /// Decode a navigator from a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        crate::config::TrackedItemsConfig::from_json(json)?.build()
    }

    /// Decode a navigator from a YAML configuration document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        crate::config::TrackedItemsConfig::from_yaml(yaml)?.build()
    }

    /// Decode a navigator from an already parsed configuration document.
    pub fn from_value(value: Value) -> Result<Self> {
        crate::config::TrackedItemsConfig::from_value(value)?.build()
    }

    pub fn activity_identifier(&self) -> &str {
        &self.activity_identifier
    }

    pub fn catalog(&self) -> &TrackedCatalog {
        &self.catalog
    }

    pub fn task_context(&self) -> Option<&TaskContext> {
        self.task_context.as_ref()
    }

    /// Whether prior client data was imported at setup.
    pub fn has_previous_client_data(&self) -> bool {
        self.previous_client_data.is_some()
    }

    pub fn detail_templates(&self) -> &[DetailStep] {
        self.detail_steps.templates()
    }

    // =========================================================================
    // Setup
    // =========================================================================

    /// Replace the items shown by the selection, review and logging steps.
    pub fn set_catalog(
        &mut self,
        items: Vec<TrackedItem>,
        sections: Option<Vec<TrackedSection>>,
    ) -> Result<()> {
        let catalog = TrackedCatalog::new(items, sections)?;
        let steps = [&mut self.selection_step, &mut self.logging_step]
            .into_iter()
            .chain(self.review_step.as_mut());
        for step in steps {
            if let Some(items_step) = step.as_items_mut() {
                items_step.set_catalog(&catalog);
            }
        }
        self.in_memory.refresh_requirements(&catalog);
        self.catalog = catalog;
        Ok(())
    }

    /// Import previously persisted client data.
    ///
    /// On error the current selection and any earlier import are left
    /// untouched.
    pub fn set_previous_client_data(&mut self, data: Value) -> Result<()> {
        self.in_memory.import_client_data(&data, &self.catalog)?;
        self.previous_client_data = Some(data);
        Ok(())
    }

    /// Bind the navigator to a running task and import its prior client data.
    ///
    /// Malformed prior data is logged and ignored.
    pub fn setup_tracking(&mut self, context: TaskContext, source: &dyn ClientDataSource) {
        debug!(
            activity = %self.activity_identifier,
            task = %context.task_identifier,
            subtask = context.is_subtask(),
            "Setting up tracking"
        );
        self.task_context = Some(context);
        if let Some(data) = source.client_data(&self.activity_identifier) {
            if let Err(err) = self.set_previous_client_data(data) {
                warn!(
                    activity = %self.activity_identifier,
                    error = %err,
                    "Ignoring malformed prior client data"
                );
            }
        }
    }

    /// Substitute or patch the default step of a role.
    pub fn apply_override(&mut self, role: StepRole, step_override: StepOverride) -> Result<()> {
        match step_override {
            StepOverride::Definition(definition) => {
                debug!(role = role.as_str(), kind = definition.type_name(), "Replacing step");
                match role {
                    StepRole::Selection => {
                        self.selection_step =
                            TrackingStep::Selection(definition.into_items_step(role, &self.catalog)?);
                    }
                    StepRole::Review => {
                        self.review_step =
                            Some(TrackingStep::Review(definition.into_items_step(role, &self.catalog)?));
                    }
                    StepRole::Logging => {
                        self.logging_step =
                            TrackingStep::Logging(definition.into_items_step(role, &self.catalog)?);
                    }
                    StepRole::Reminder => {
                        self.reminder_step =
                            Some(TrackingStep::Reminder(definition.into_reminder_step()?));
                    }
                    StepRole::AddDetails => {
                        self.detail_steps
                            .set_templates(vec![definition.into_detail_step()?]);
                    }
                }
            }
            StepOverride::Patch(patch) => {
                let patched = match role {
                    StepRole::Selection => Some(&mut self.selection_step),
                    StepRole::Review => self.review_step.as_mut(),
                    StepRole::Logging => Some(&mut self.logging_step),
                    StepRole::Reminder => self.reminder_step.as_mut(),
                    StepRole::AddDetails => {
                        if !self.detail_steps.patch_first_template(&patch) {
                            debug!(role = role.as_str(), "No default step to patch");
                        }
                        return Ok(());
                    }
                };
                match patched {
                    Some(step) => patch.apply_to(step),
                    None => debug!(role = role.as_str(), "No default step to patch"),
                }
            }
        }
        Ok(())
    }

    /// Replace all detail step templates.
    pub fn set_detail_templates(&mut self, templates: Vec<DetailStep>) {
        self.detail_steps.set_templates(templates);
    }

    // =========================================================================
    // Step lookup
    // =========================================================================

    fn role_of(&self, identifier: &str) -> Option<StepRole> {
        [
            Some(&self.selection_step),
            self.review_step.as_ref(),
            Some(&self.logging_step),
            self.reminder_step.as_ref(),
        ]
        .into_iter()
        .flatten()
        .find(|s| s.identifier() == identifier)
        .map(TrackingStep::role)
    }

    fn singleton_mut(&mut self, role: StepRole) -> Option<&mut TrackingStep> {
        match role {
            StepRole::Selection => Some(&mut self.selection_step),
            StepRole::Review => self.review_step.as_mut(),
            StepRole::Logging => Some(&mut self.logging_step),
            StepRole::Reminder => self.reminder_step.as_mut(),
            StepRole::AddDetails => None,
        }
    }

    /// Properties of the step `identifier` resolves to, without resolving it.
    fn step_info(&self, identifier: &str) -> Option<&StepInfo> {
        if let Some(role) = self.role_of(identifier) {
            return match role {
                StepRole::Selection => Some(self.selection_step.info()),
                StepRole::Review => self.review_step.as_ref().map(TrackingStep::info),
                StepRole::Logging => Some(self.logging_step.info()),
                StepRole::Reminder => self.reminder_step.as_ref().map(TrackingStep::info),
                StepRole::AddDetails => None,
            };
        }
        if !self.in_memory.peek()?.is_selected(identifier) {
            return None;
        }
        self.detail_steps.info_for(self.catalog.item(identifier)?)
    }

    /// Resolve a step identifier, attaching the current result.
    pub fn step(&mut self, identifier: &str) -> Option<&TrackingStep> {
        if let Some(role) = self.role_of(identifier) {
            let snapshot = self.in_memory.get_mut().clone();
            let step = self.singleton_mut(role)?;
            step.attach_result(&snapshot);
            return Some(&*step);
        }
        self.detail_step(identifier).map(|(step, _)| step)
    }

    /// The detail step for a selected item together with its answer.
    ///
    /// `None` when the item is not selected, not in the catalog, or has no
    /// detail template.
    pub fn detail_step(&mut self, identifier: &str) -> Option<(&TrackingStep, &TrackedItemAnswer)> {
        let item = self.catalog.item(identifier)?;
        let answer = self.in_memory.peek()?.answer(identifier)?;
        let step = self.detail_steps.lookup(item, answer)?;
        Some((step, answer))
    }

    pub fn selection_step(&mut self) -> &TrackingStep {
        let snapshot = self.in_memory.get_mut().clone();
        self.selection_step.attach_result(&snapshot);
        &self.selection_step
    }

    pub fn review_step(&mut self) -> Option<&TrackingStep> {
        let snapshot = self.in_memory.get_mut().clone();
        let step = self.review_step.as_mut()?;
        step.attach_result(&snapshot);
        Some(&*step)
    }

    pub fn logging_step(&mut self) -> &TrackingStep {
        let snapshot = self.in_memory.get_mut().clone();
        self.logging_step.attach_result(&snapshot);
        &self.logging_step
    }

    pub fn reminder_step(&self) -> Option<&TrackingStep> {
        self.reminder_step.as_ref()
    }

    /// The live tracked items result.
    pub fn in_memory_result(&mut self) -> &TrackedItemsCollectionResult {
        self.in_memory.get_mut()
    }

    /// The live result in its persisted layout, for the host to store.
    pub fn export_client_data(&mut self) -> Result<Value> {
        Ok(serde_json::to_value(self.in_memory.get_mut())?)
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Fold the completed step's result into the in-memory result, publish it,
    /// and resolve the next step.
    ///
    /// `step` is `None` before the first step is shown. A next step of `None`
    /// means the flow is finished or the next step is skipped.
    pub fn step_after(
        &mut self,
        step: Option<&str>,
        task_result: &mut TaskResult,
    ) -> (Option<&TrackingStep>, NavigationDirection) {
        let found = step.and_then(|id| task_result.find_result(id).cloned());
        if let (Some(identifier), Some(result)) = (step, found.as_ref()) {
            self.fold_result(identifier, result);
        }

        let published = self
            .in_memory
            .get_mut()
            .copy_with(self.activity_identifier.clone());
        task_result.append_async_result(StepResult::new(
            self.activity_identifier.clone(),
            StepOutcome::Collection(published),
        ));

        let direction = if found.as_ref().is_some_and(StepResult::is_remove_items) {
            NavigationDirection::Reverse
        } else {
            NavigationDirection::Forward
        };

        let Some(next) = self.next_identifier(step, found.as_ref()) else {
            info!(activity = %self.activity_identifier, "Tracking flow finished");
            return (None, direction);
        };
        if self.should_skip(&next) {
            debug!(step = %next, "Skipping step");
            return (None, direction);
        }
        debug!(from = ?step, to = %next, ?direction, "Navigating");
        (self.step(&next), direction)
    }

    fn fold_result(&mut self, identifier: &str, result: &StepResult) {
        if let StepOutcome::RemoveItems { items } = &result.outcome {
            self.in_memory.update_selected_by_removing(items);
            return;
        }
        match self.role_of(identifier) {
            Some(StepRole::Selection) => match &result.outcome {
                StepOutcome::Selection { selected_identifiers } => {
                    self.in_memory.update_selected(selected_identifiers, &self.catalog)
                }
                StepOutcome::Collection(collection) => self
                    .in_memory
                    .update_selected(collection.selected_identifiers(), &self.catalog),
                other => warn!(step = %identifier, outcome = ?other, "Selection step reported no selection"),
            },
            Some(StepRole::Review) => {
                debug_assert!(
                    matches!(result.outcome, StepOutcome::Collection(_)),
                    "review step `{identifier}` must report a collection result"
                );
                match &result.outcome {
                    StepOutcome::Collection(collection) => {
                        self.in_memory.replace(collection.clone(), &self.catalog)
                    }
                    other => {
                        error!(step = %identifier, outcome = ?other, "Review step did not report a collection result")
                    }
                }
            }
            _ => self.in_memory.update_details(result),
        }
    }

    fn next_identifier(&self, step: Option<&str>, found: Option<&StepResult>) -> Option<String> {
        let Some(current) = step else {
            let has_answers = self
                .in_memory
                .peek()
                .is_some_and(|r| !r.selected_answers().is_empty());
            let start = if self.has_previous_client_data() && has_answers {
                &self.logging_step
            } else {
                &self.selection_step
            };
            return Some(start.identifier().to_string());
        };

        if let Some(target) = self.override_target(current, found) {
            return Some(target);
        }

        match self.role_of(current) {
            Some(StepRole::Selection) => Some(self.review_or_logging()),
            Some(StepRole::Review) => {
                if !self.in_memory.has_selection() {
                    return Some(self.selection_step.identifier().to_string());
                }
                if let Some(next) = self.next_incomplete_detail(current) {
                    return Some(next);
                }
                if self.has_previous_client_data() {
                    return Some(self.logging_step.identifier().to_string());
                }
                self.reminder_step.as_ref().map(|s| s.identifier().to_string())
            }
            Some(StepRole::Logging) => None,
            Some(StepRole::Reminder) => match self.review_step {
                None => Some(self.logging_step.identifier().to_string()),
                Some(_) => self.next_incomplete_detail(current),
            },
            _ => {
                if let Some(next) = self.next_incomplete_detail(current) {
                    return Some(next);
                }
                if !self.in_memory.has_selection() {
                    return Some(self.selection_step.identifier().to_string());
                }
                Some(self.review_or_logging())
            }
        }
    }

    fn review_or_logging(&self) -> String {
        self.review_step
            .as_ref()
            .unwrap_or(&self.logging_step)
            .identifier()
            .to_string()
    }

    /// The completed step's jump target, when it resolves to a step.
    fn override_target(&self, current: &str, found: Option<&StepResult>) -> Option<String> {
        let target = found
            .and_then(|r| r.skip_to_identifier.clone())
            .or_else(|| {
                self.step_info(current)
                    .and_then(|info| info.next_step_identifier.clone())
            })?;
        if self.step_info(&target).is_some() {
            Some(target)
        } else {
            debug!(from = %current, target = %target, "Ignoring unresolved jump target");
            None
        }
    }

    /// Next selected item, after `start` and wrapping, whose detail answer is
    /// incomplete. `start` itself is never returned.
    ///
    /// When `start` is not selected the scan begins with the first selected
    /// item.
    fn next_incomplete_detail(&self, start: &str) -> Option<String> {
        let result = self.in_memory.peek()?;
        let selected = result.selected_identifiers();
        let len = selected.len();
        let (first, count) = match selected.iter().position(|id| id == start) {
            Some(pos) => (pos + 1, len.saturating_sub(1)),
            None => (0, len),
        };
        (0..count)
            .map(|offset| &selected[(first + offset) % len])
            .find(|id| self.needs_details(result, id))
            .cloned()
    }

    fn needs_details(&self, result: &TrackedItemsCollectionResult, identifier: &str) -> bool {
        let has_template = self
            .catalog
            .item(identifier)
            .is_some_and(|item| self.detail_steps.has_template(item));
        has_template
            && result
                .answer(identifier)
                .is_some_and(|a| !a.has_required_values())
    }

    /// The step shown when navigating back from `identifier`.
    pub fn step_before(&mut self, identifier: &str) -> Option<&TrackingStep> {
        match self.role_of(identifier) {
            Some(StepRole::Selection | StepRole::Review | StepRole::Logging) => None,
            _ => self.review_step(),
        }
    }

    /// Whether a step follows `step`. `None` means before the first step.
    pub fn has_step_after(&self, step: Option<&str>) -> bool {
        match step.and_then(|id| self.role_of(id)) {
            Some(StepRole::Logging) => false,
            Some(StepRole::Review) => !self.in_memory.has_required_values(),
            _ => true,
        }
    }

    pub fn has_step_before(&self, identifier: &str) -> bool {
        !matches!(
            self.role_of(identifier),
            Some(StepRole::Selection | StepRole::Review | StepRole::Logging)
        )
    }

    /// Whether the host should skip `identifier`. Only steps of a flow
    /// embedded in a parent task are ever skipped.
    pub fn should_skip(&self, identifier: &str) -> bool {
        if !self.task_context.as_ref().is_some_and(TaskContext::is_subtask) {
            return false;
        }
        self.step_info(identifier)
            .is_some_and(|info| info.skip_rule.should_skip(self.in_memory.has_selection()))
    }

    /// The navigator never ends the task early.
    pub fn should_exit(&self, _identifier: &str) -> bool {
        false
    }

    /// Progress as `(current, total)`; the flow length is not known upfront.
    pub fn progress(&self, _identifier: &str) -> Option<(usize, usize)> {
        None
    }
}
