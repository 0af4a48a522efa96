//! Navigator configuration documents.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::catalog::{TrackedCatalog, TrackedItem, TrackedSection};
use crate::error::Result;
use crate::navigator::TrackedItemsStepNavigator;
use crate::step::{
    DefaultStepBuilder, DetailStep, StepDefinition, StepOverride, StepRole, StepTemplateBuilder,
};

/// A tracked-items task as configured by the host.
///
/// Each role key holds either a typed step definition that replaces the
/// default step, or a patch applied to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedItemsConfig {
    /// Activity identifier; also names the published result
    pub identifier: String,
    /// Trackable items
    pub items: Vec<TrackedItem>,
    /// Display sections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<TrackedSection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<Value>,
    /// One override, or an array of typed detail templates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder: Option<Value>,
}

impl TrackedItemsConfig {
    pub fn new(identifier: impl Into<String>, items: Vec<TrackedItem>) -> Self {
        Self {
            identifier: identifier.into(),
            items,
            ..Default::default()
        }
    }

    /// Load config from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Build a navigator on top of the default steps.
    pub fn build(self) -> Result<TrackedItemsStepNavigator> {
        self.build_with(&DefaultStepBuilder)
    }

    /// Build a navigator whose default steps come from `builder`, then apply
    /// the role overrides. Any decode error fails the whole build.
    pub fn build_with(self, builder: &dyn StepTemplateBuilder) -> Result<TrackedItemsStepNavigator> {
        let catalog = TrackedCatalog::new(self.items, self.sections)?;
        let mut navigator = TrackedItemsStepNavigator::with_builder(self.identifier, catalog, builder);

        let overrides = [
            (StepRole::Selection, self.selection),
            (StepRole::Review, self.review),
            (StepRole::Logging, self.logging),
            (StepRole::Reminder, self.reminder),
        ];
        for (role, value) in overrides {
            if let Some(value) = value {
                navigator.apply_override(role, StepOverride::from_value(value)?)?;
            }
        }

        match self.add_details {
            Some(Value::Array(definitions)) => {
                let templates = definitions
                    .into_iter()
                    .map(|value| -> Result<DetailStep> {
                        serde_json::from_value::<StepDefinition>(value)?.into_detail_step()
                    })
                    .collect::<Result<Vec<_>>>()?;
                navigator.set_detail_templates(templates);
            }
            Some(value) => {
                navigator.apply_override(StepRole::AddDetails, StepOverride::from_value(value)?)?
            }
            None => {}
        }

        debug!(
            activity = %navigator.activity_identifier(),
            items = navigator.catalog().items().len(),
            templates = navigator.detail_templates().len(),
            "Built tracked items navigator"
        );
        Ok(navigator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackingError;
    use crate::step::DetailedStepBuilder;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "identifier": "medication",
            "items": [
                { "identifier": "a", "addDetailsIdentifier": "medicationDetails", "requiredFields": ["dose"] },
                { "identifier": "b", "sectionIdentifier": "pills" }
            ],
            "sections": [{ "identifier": "pills", "items": ["b"] }],
            "review": { "type": "review", "title": "Review medications" },
            "addDetails": [{ "type": "trackedItemDetails", "identifier": "medicationDetails" }],
            "logging": { "title": "Log" },
            "reminder": { "type": "trackedItemReminders", "reminderChoices": [15, 60] }
        })
    }

    #[test]
    fn test_build_from_document() {
        let mut navigator = TrackedItemsStepNavigator::from_value(document()).unwrap();
        assert_eq!(navigator.activity_identifier(), "medication");
        assert_eq!(navigator.catalog().items_in_section("pills").len(), 1);
        assert_eq!(
            navigator.review_step().unwrap().info().title.as_deref(),
            Some("Review medications")
        );
        assert_eq!(navigator.logging_step().info().title.as_deref(), Some("Log"));
        assert_eq!(navigator.detail_templates().len(), 1);
        assert_eq!(
            navigator.reminder_step().unwrap().as_reminder().unwrap().reminder_choices,
            vec![15, 60]
        );
    }

    #[test]
    fn test_incompatible_override_is_fatal() {
        let mut doc = document();
        doc["selection"] = json!({ "type": "reminder" });
        let err = TrackedItemsStepNavigator::from_value(doc).unwrap_err();
        assert!(matches!(err, TrackingError::TypeMismatch { .. }));

        let mut doc = document();
        doc["items"] = json!([{ "identifier": "a" }, { "identifier": "a" }]);
        assert!(matches!(
            TrackedItemsStepNavigator::from_value(doc),
            Err(TrackingError::DuplicateItem(_))
        ));
    }

    #[test]
    fn test_missing_identifier_or_items_is_fatal() {
        let err = TrackedItemsStepNavigator::from_value(json!({ "review": { "type": "review" } }))
            .unwrap_err();
        assert!(matches!(err, TrackingError::Json(_)));

        assert!(TrackedItemsConfig::from_value(json!({ "identifier": "medication" })).is_err());
        assert!(TrackedItemsConfig::from_value(json!({ "items": [{ "identifier": "a" }] })).is_err());
        assert!(TrackedItemsConfig::from_yaml("identifier: symptoms\n").is_err());
    }

    #[test]
    fn test_add_details_patch_edits_first_template() {
        let config = TrackedItemsConfig::from_value(json!({
            "identifier": "medication",
            "items": [{ "identifier": "a", "addDetailsIdentifier": "medicationDetails" }],
            "addDetails": { "title": "Dosage" }
        }))
        .unwrap();
        let navigator = config.build_with(&DetailedStepBuilder::new()).unwrap();
        assert_eq!(navigator.detail_templates()[0].info.title.as_deref(), Some("Dosage"));
    }

    #[test]
    fn test_yaml_round_trip() {
        let yaml = r#"
identifier: symptoms
items:
  - identifier: headache
    addDetailsIdentifier: severity
review:
  type: trackedItems
  nextStepIdentifier: logging
"#;
        let config = TrackedItemsConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.items.len(), 1);
        let reparsed = TrackedItemsConfig::from_yaml(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(reparsed, config);

        let navigator = TrackedItemsStepNavigator::from_yaml(yaml).unwrap();
        assert_eq!(navigator.catalog().items()[0].identifier, "headache");
    }
}
