//! Study-wide settings.

use chrono::{DateTime, Days, Months, Utc};
use serde::{Deserialize, Serialize};

/// Length of the study as calendar components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyDuration {
    #[serde(default)]
    pub year: u32,
    #[serde(default)]
    pub month: u32,
    #[serde(default)]
    pub day: u32,
}

impl Default for StudyDuration {
    fn default() -> Self {
        Self {
            year: 1,
            month: 0,
            day: 0,
        }
    }
}

impl StudyDuration {
    /// When a study started at `start` ends. `None` on overflow.
    pub fn end_date(&self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        start
            .checked_add_months(Months::new(self.year.checked_mul(12)?.checked_add(self.month)?))?
            .checked_add_days(Days::new(u64::from(self.day)))
    }
}

/// Settings decoded from the client data mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySettings {
    /// Duration of the study
    #[serde(default)]
    pub study_duration: StudyDuration,
    /// Upload schemas use v1 legacy archiving
    #[serde(default)]
    pub uses_v1_legacy_archiving: bool,
}

impl StudySettings {
    /// Load settings from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
