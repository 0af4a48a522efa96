//! The study configuration store.
//!
//! Holds every mapping decoded from the app config. Safe to share across
//! threads; lookups return owned snapshots.

use dashmap::DashMap;
use serde_json::Value;
use std::sync::RwLock;
use tracing::{debug, info, warn};

use tracked_items::{ClientDataSource, TrackedItemsStepNavigator};

use crate::error::{ConfigError, Result};
use crate::settings::StudySettings;
use crate::types::{
    ActivityGroup, ActivityInfo, ActivityMapping, AppConfig, CategoryType, ConfigElementHeader,
    ReportCategory, SchemaReference, SurveyReference, TaskDefinition, TaskSource,
};

/// Registry of activities, tasks, schemas and surveys for one study.
#[derive(Debug, Default)]
pub struct StudyConfiguration {
    activity_groups: DashMap<String, ActivityGroup>,
    activity_infos: DashMap<String, ActivityInfo>,
    schema_references: DashMap<String, SchemaReference>,
    survey_references: DashMap<String, SurveyReference>,
    tasks: DashMap<String, TaskDefinition>,
    task_to_schema: DashMap<String, String>,
    report_categories: DashMap<String, ReportCategory>,
    prior_client_data: DashMap<String, Value>,
    settings: RwLock<StudySettings>,
}

impl StudyConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with the given settings.
    pub fn with_settings(settings: StudySettings) -> Self {
        Self {
            settings: RwLock::new(settings),
            ..Self::default()
        }
    }

    /// Current settings.
    pub fn settings(&self) -> StudySettings {
        self.settings.read().map(|s| s.clone()).unwrap_or_default()
    }

    fn update_settings(&self, update: impl FnOnce(&mut StudySettings)) {
        if let Ok(mut settings) = self.settings.write() {
            update(&mut settings);
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Register everything in an app config.
    ///
    /// Schemas and surveys are always registered. A malformed `clientData`
    /// returns [`ConfigError::ClientData`] so the host can refresh its app
    /// config. Config elements that fail to decode are logged and skipped.
    pub fn setup(&self, app_config: &AppConfig) -> Result<()> {
        for schema in &app_config.schema_references {
            self.add_schema_reference(schema.clone());
        }
        for survey in &app_config.survey_references {
            self.add_survey_reference(survey.clone());
        }

        if let Some(client_data) = &app_config.client_data {
            let mapping: ActivityMapping =
                serde_json::from_value(client_data.clone()).map_err(ConfigError::ClientData)?;
            self.add_activity_mapping(mapping);
        }

        for (key, element) in &app_config.config_elements {
            self.add_config_element(key, element);
        }

        info!(
            tasks = self.tasks.len(),
            activities = self.activity_infos.len(),
            schemas = self.schema_references.len(),
            surveys = self.survey_references.len(),
            "Study configuration loaded"
        );
        Ok(())
    }

    /// Register the contents of a decoded client data mapping.
    pub fn add_activity_mapping(&self, mapping: ActivityMapping) {
        if let Some(duration) = mapping.study_duration {
            self.update_settings(|s| s.study_duration = duration);
        }
        if let Some(legacy) = mapping.uses_v1_legacy_archiving {
            self.update_settings(|s| s.uses_v1_legacy_archiving = legacy);
        }
        for group in mapping.groups.into_iter().flatten() {
            self.add_activity_group(group);
        }
        for info in mapping.activity_list.into_iter().flatten() {
            self.add_activity_info(info);
        }
        for task in mapping.tasks.into_iter().flatten() {
            self.add_task(task);
        }
        for (activity, schema) in mapping.task_to_schema_identifier_map.into_iter().flatten() {
            self.add_schema_mapping(activity, schema);
        }
        for (report, category) in mapping.report_mappings.into_iter().flatten() {
            self.add_report_category(report, category);
        }
    }

    /// Decode one config element by its `catType`.
    ///
    /// Returns `true` when the element was registered.
    pub fn add_config_element(&self, key: &str, element: &Value) -> bool {
        let header: ConfigElementHeader = match serde_json::from_value(element.clone()) {
            Ok(header) => header,
            Err(err) => {
                warn!(key = %key, error = %err, "Failed to decode config element");
                return false;
            }
        };

        match header.cat_type {
            CategoryType::Task => {
                let mut element = element.clone();
                if let Some(obj) = element.as_object_mut() {
                    obj.remove("catType");
                    obj.entry("identifier")
                        .or_insert_with(|| Value::String(key.to_string()));
                }
                match serde_json::from_value::<TaskDefinition>(element) {
                    Ok(task) => {
                        self.add_task(task);
                        true
                    }
                    Err(err) => {
                        warn!(key = %key, error = %err, "Failed to decode task config element");
                        false
                    }
                }
            }
            CategoryType::Unsupported => {
                debug!(key = %key, "Ignoring config element of unsupported category");
                false
            }
        }
    }

    pub fn add_activity_group(&self, group: ActivityGroup) {
        self.activity_groups.insert(group.identifier.clone(), group);
    }

    pub fn add_activity_info(&self, info: ActivityInfo) {
        self.activity_infos.insert(info.identifier.clone(), info);
    }

    pub fn add_schema_reference(&self, schema: SchemaReference) {
        self.schema_references.insert(schema.identifier.clone(), schema);
    }

    pub fn add_survey_reference(&self, survey: SurveyReference) {
        self.survey_references.insert(survey.identifier.clone(), survey);
    }

    /// Register a task. An activity info running it is added unless one
    /// already references it by module id.
    pub fn add_task(&self, task: TaskDefinition) {
        let referenced = self
            .activity_infos
            .iter()
            .any(|info| info.module_id.as_deref() == Some(task.identifier.as_str()));
        if !referenced {
            self.add_activity_info(ActivityInfo::for_module(&task.identifier));
        }
        debug!(task = %task.identifier, "Registered task");
        self.tasks.insert(task.identifier.clone(), task);
    }

    pub fn add_schema_mapping(&self, activity_identifier: impl Into<String>, schema_identifier: impl Into<String>) {
        self.task_to_schema
            .insert(activity_identifier.into(), schema_identifier.into());
    }

    pub fn add_report_category(&self, report_identifier: impl Into<String>, category: ReportCategory) {
        self.report_categories.insert(report_identifier.into(), category);
    }

    /// Store the persisted client data for an activity.
    pub fn set_client_data(&self, activity_identifier: impl Into<String>, data: Value) {
        self.prior_client_data.insert(activity_identifier.into(), data);
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn activity_group(&self, identifier: &str) -> Option<ActivityGroup> {
        self.activity_groups.get(identifier).map(|g| g.clone())
    }

    pub fn activity_info(&self, activity_identifier: &str) -> Option<ActivityInfo> {
        self.activity_infos.get(activity_identifier).map(|i| i.clone())
    }

    /// The task for an activity, copied under the activity identifier with
    /// its schema resolved.
    pub fn task(&self, activity_identifier: &str) -> Option<TaskDefinition> {
        let stored = self.tasks.get(activity_identifier).map(|t| t.clone())?;
        Some(stored.copy_with(activity_identifier, self.schema_info(activity_identifier)))
    }

    /// The schema for an activity, through the task-to-schema map or by the
    /// activity identifier itself.
    pub fn schema_info(&self, activity_identifier: &str) -> Option<SchemaReference> {
        let schema_identifier = self
            .task_to_schema
            .get(activity_identifier)
            .map(|s| s.clone())
            .unwrap_or_else(|| activity_identifier.to_string());
        self.schema_references.get(&schema_identifier).map(|s| s.clone())
    }

    pub fn survey(&self, survey_identifier: &str) -> Option<SurveyReference> {
        self.survey_references.get(survey_identifier).map(|s| s.clone())
    }

    pub fn report_category(&self, report_identifier: &str) -> Option<ReportCategory> {
        self.report_categories.get(report_identifier).map(|c| *c)
    }

    pub fn all_surveys(&self) -> Vec<SurveyReference> {
        self.survey_references.iter().map(|s| s.clone()).collect()
    }

    pub fn all_schemas(&self) -> Vec<SchemaReference> {
        self.schema_references.iter().map(|s| s.clone()).collect()
    }

    pub fn all_activity_groups(&self) -> Vec<ActivityGroup> {
        self.activity_groups.iter().map(|g| g.clone()).collect()
    }

    /// Activity infos for a group's activities, in group order. Activities
    /// without an info are left out.
    pub fn activity_group_tasks(&self, group: &ActivityGroup) -> Vec<ActivityInfo> {
        group
            .activity_identifiers
            .iter()
            .filter_map(|id| self.activity_info(id))
            .collect()
    }

    /// Where to load an activity's task from: a registered task, then a
    /// survey, then the activity info's resource, then a resource named
    /// after the activity.
    pub fn task_source(&self, activity_identifier: &str) -> TaskSource {
        if let Some(task) = self.task(activity_identifier) {
            return TaskSource::Task(task);
        }
        if let Some(survey) = self.survey(activity_identifier) {
            return TaskSource::Survey(survey);
        }
        if let Some(resource) = self
            .activity_info(activity_identifier)
            .and_then(|info| info.resource)
        {
            return TaskSource::Resource(resource);
        }
        TaskSource::Named(activity_identifier.to_string())
    }

    /// Build the tracked-items navigator for a registered task, with any
    /// stored client data imported.
    pub fn tracked_items_navigator(&self, activity_identifier: &str) -> Result<TrackedItemsStepNavigator> {
        let task = self
            .task(activity_identifier)
            .ok_or_else(|| ConfigError::UnknownTask(activity_identifier.to_string()))?;
        let mut navigator = task.tracked_items_config()?.build()?;
        if let Some(data) = self.client_data(activity_identifier) {
            if let Err(err) = navigator.set_previous_client_data(data) {
                warn!(activity = %activity_identifier, error = %err, "Ignoring malformed prior client data");
            }
        }
        Ok(navigator)
    }
}

impl ClientDataSource for StudyConfiguration {
    fn client_data(&self, activity_identifier: &str) -> Option<Value> {
        self.prior_client_data.get(activity_identifier).map(|d| d.clone())
    }
}
