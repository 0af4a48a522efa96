//! App config loading and lookup integration tests

use serde_json::{json, Value};
use study_config::{AppConfig, ConfigError, ReportCategory, StudyConfiguration, TaskSource};
use tracked_items::{ClientDataSource, TaskContext, TaskResult};

fn app_config() -> AppConfig {
    serde_json::from_value(json!({
        "clientData": {
            "studyDuration": { "year": 2 },
            "usesV1LegacyArchiving": true,
            "groups": [{
                "identifier": "daily",
                "title": "Daily activities",
                "activityIdentifiers": ["medication", "tapping", "unknown"],
                "schedulePlanGuid": "abcdef12-3456-7890"
            }],
            "activityList": [{
                "identifier": "tapping",
                "title": "Tapping",
                "minuteDuration": 2,
                "moduleId": "tapping"
            }],
            "tasks": [{
                "identifier": "medication",
                "type": "trackedItems",
                "items": [
                    { "identifier": "aspirin", "addDetailsIdentifier": "medicationDetails", "requiredFields": ["dose"] },
                    { "identifier": "ibuprofen" }
                ],
                "review": { "type": "review" },
                "addDetails": [{ "type": "details", "identifier": "medicationDetails" }]
            }],
            "taskToSchemaIdentifierMap": { "medication": "MedicationTracking" },
            "reportMappings": { "medication": "singleton" }
        },
        "schemaReferences": [
            { "identifier": "MedicationTracking", "revision": 4 },
            { "identifier": "tapping", "revision": 1 }
        ],
        "surveyReferences": [
            { "identifier": "background", "guid": "survey-guid", "href": "https://example.org/surveys/background" }
        ],
        "configElements": {
            "symptoms": {
                "catType": "task",
                "type": "trackedItems",
                "items": [{ "identifier": "headache" }]
            },
            "profile": { "catType": "profileManager" }
        }
    }))
    .unwrap()
}

#[test]
fn test_setup_registers_mappings() {
    let store = StudyConfiguration::new();
    store.setup(&app_config()).unwrap();

    let settings = store.settings();
    assert_eq!(settings.study_duration.year, 2);
    assert!(settings.uses_v1_legacy_archiving);

    assert_eq!(store.all_activity_groups().len(), 1);
    assert_eq!(store.all_schemas().len(), 2);
    assert_eq!(store.all_surveys().len(), 1);
    assert_eq!(store.report_category("medication"), Some(ReportCategory::Singleton));

    let task = store.task("medication").unwrap();
    assert_eq!(task.schema_info.unwrap().revision, Some(4));
    assert_eq!(store.task("symptoms").unwrap().task_type(), Some("trackedItems"));
    assert!(store.task("profile").is_none());

    let group = store.activity_group("daily").unwrap();
    let infos: Vec<String> = store
        .activity_group_tasks(&group)
        .into_iter()
        .map(|i| i.identifier)
        .collect();
    assert_eq!(infos, vec!["medication", "tapping"]);
    assert_eq!(store.activity_info("tapping").unwrap().estimated_minutes(), 2);

    assert!(matches!(store.task_source("background"), TaskSource::Survey(_)));
}

#[test]
fn test_malformed_client_data_still_registers_references() {
    let store = StudyConfiguration::new();
    let mut config = app_config();
    config.client_data = Some(json!({ "groups": "not a list" }));

    let err = store.setup(&config).unwrap_err();
    assert!(matches!(err, ConfigError::ClientData(_)));
    assert_eq!(store.all_schemas().len(), 2);
    assert!(store.task("medication").is_none());
}

#[test]
fn test_navigator_from_registered_task() {
    let store = StudyConfiguration::new();
    store.setup(&app_config()).unwrap();
    store.set_client_data(
        "medication",
        json!({
            "selectedIdentifiers": ["aspirin"],
            "selectedAnswers": [{ "identifier": "aspirin", "dose": "5 mg" }]
        }),
    );

    let mut navigator = store.tracked_items_navigator("medication").unwrap();
    assert_eq!(navigator.activity_identifier(), "medication");
    assert!(navigator.review_step().is_some());
    assert!(navigator.has_previous_client_data());

    let mut task = TaskResult::new("medication");
    let (next, _) = navigator.step_after(None, &mut task);
    assert_eq!(next.unwrap().identifier(), "logging");

    assert!(matches!(
        store.tracked_items_navigator("missing"),
        Err(ConfigError::UnknownTask(_))
    ));
}

#[test]
fn test_store_as_client_data_source() {
    let store = StudyConfiguration::new();
    store.setup(&app_config()).unwrap();
    store.set_client_data("medication", json!([{ "identifier": "ibuprofen" }]));

    let mut navigator = store.tracked_items_navigator("medication").unwrap();
    let task = TaskResult::new("medication");
    navigator.setup_tracking(TaskContext::new("medication", task.task_run_uuid), &store);
    assert_eq!(
        navigator.in_memory_result().selected_identifiers(),
        ["ibuprofen".to_string()].as_slice()
    );
    assert_eq!(store.client_data("symptoms"), None::<Value>);
}

#[test]
fn test_concurrent_lookups() {
    let store = StudyConfiguration::new();
    store.setup(&app_config()).unwrap();

    std::thread::scope(|scope| {
        for i in 0..4 {
            let store = &store;
            scope.spawn(move || {
                store.set_client_data(format!("activity{i}"), json!([]));
                assert!(store.task("medication").is_some());
                assert!(store.schema_info("tapping").is_some());
            });
        }
    });

    assert!((0..4).all(|i| store.client_data(&format!("activity{i}")).is_some()));
}
