//! Configuration documents served by the study's app config.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use tracked_items::TrackedItemsConfig;

use crate::settings::StudyDuration;

// ============================================================================
// References
// ============================================================================

/// An upload schema published for the study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaReference {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u32>,
}

impl SchemaReference {
    pub fn new(identifier: impl Into<String>, revision: Option<u32>) -> Self {
        Self {
            identifier: identifier.into(),
            revision,
        }
    }
}

/// A survey published for the study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyReference {
    pub identifier: String,
    #[serde(default)]
    pub guid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// A task bundled as a resource file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceReference {
    pub resource_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_type: Option<String>,
}

impl ResourceReference {
    pub fn named(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            bundle_identifier: None,
            class_type: None,
        }
    }
}

// ============================================================================
// Activities
// ============================================================================

/// How reports with a given identifier are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportCategory {
    /// One report per upload
    Timestamp,
    /// A single report that is overwritten
    Singleton,
    /// One report per calendar day
    GroupByDay,
}

/// Display and loading information for one activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityInfo {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Estimated duration in minutes
    #[serde(rename = "minuteDuration", default, skip_serializing_if = "Option::is_none")]
    pub minute_duration: Option<u32>,
    /// Resource the task is loaded from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceReference>,
    /// Identifier of the task module this activity runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_id: Option<String>,
}

impl ActivityInfo {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: None,
            subtitle: None,
            detail: None,
            minute_duration: None,
            resource: None,
            module_id: None,
        }
    }

    /// Activity info that runs the task module of the same name.
    pub fn for_module(task_identifier: &str) -> Self {
        Self {
            module_id: Some(task_identifier.to_string()),
            ..Self::new(task_identifier)
        }
    }

    pub fn estimated_minutes(&self) -> u32 {
        self.minute_duration.unwrap_or(0)
    }

    /// Copy under another identifier.
    pub fn copy_with(&self, identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..self.clone()
        }
    }
}

/// A group of activities scheduled together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityGroup {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journey_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default)]
    pub activity_identifiers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_identifier: Option<String>,
    /// Schedule plan shared by every activity in the group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_plan_guid: Option<String>,
    /// Per-activity schedule guids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_guid_map: Option<HashMap<String, String>>,
}

// ============================================================================
// Tasks
// ============================================================================

/// A task definition as registered from client data or a config element.
///
/// Everything besides `identifier` is kept as the raw document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub identifier: String,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
    /// Schema resolved for the activity this copy was requested for
    #[serde(skip)]
    pub schema_info: Option<SchemaReference>,
}

impl TaskDefinition {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            properties: Map::new(),
            schema_info: None,
        }
    }

    /// Builder: set a property.
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// The task's `type`, if declared.
    pub fn task_type(&self) -> Option<&str> {
        self.properties.get("type").and_then(Value::as_str)
    }

    /// Copy for an activity identifier with its resolved schema.
    pub fn copy_with(&self, identifier: impl Into<String>, schema_info: Option<SchemaReference>) -> Self {
        Self {
            identifier: identifier.into(),
            properties: self.properties.clone(),
            schema_info,
        }
    }

    /// Decode the task as a tracked-items flow.
    pub fn tracked_items_config(&self) -> tracked_items::Result<TrackedItemsConfig> {
        TrackedItemsConfig::from_value(serde_json::to_value(self)?)
    }
}

/// Where a task is loaded from, in lookup priority order.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskSource {
    /// A registered task definition
    Task(TaskDefinition),
    /// A published survey
    Survey(SurveyReference),
    /// The resource named by the activity info
    Resource(ResourceReference),
    /// A resource named after the activity identifier
    Named(String),
}

// ============================================================================
// App config
// ============================================================================

/// The `clientData` mapping of an app config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_duration: Option<StudyDuration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses_v1_legacy_archiving: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<ActivityGroup>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_list: Option<Vec<ActivityInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<TaskDefinition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_to_schema_identifier_map: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_mappings: Option<HashMap<String, ReportCategory>>,
}

/// The app config document fetched for the study.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_data: Option<Value>,
    #[serde(default)]
    pub schema_references: Vec<SchemaReference>,
    #[serde(default)]
    pub survey_references: Vec<SurveyReference>,
    /// Config elements by key, each tagged with a `catType`
    #[serde(default)]
    pub config_elements: HashMap<String, Value>,
}

impl AppConfig {
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Category of a config element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum CategoryType {
    Task,
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConfigElementHeader {
    pub cat_type: CategoryType,
}
