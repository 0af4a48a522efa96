//! End-to-end navigation through tracked-items flows

use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracked_items::{
    DefaultStepBuilder, DetailedStepBuilder, NavigationDirection, StepOutcome, StepResult,
    TaskContext, TaskResult, TrackedCatalog, TrackedItem, TrackedItemsCollectionResult,
    TrackedItemsStepNavigator,
};

fn medication(id: &str) -> TrackedItem {
    TrackedItem::new(id)
        .with_details("medicationDetails")
        .with_required_fields(["dose"])
}

fn detailed(items: Vec<TrackedItem>) -> TrackedItemsStepNavigator {
    let catalog = TrackedCatalog::new(items, None).unwrap();
    TrackedItemsStepNavigator::with_builder("medication", catalog, &DetailedStepBuilder::new())
}

/// Record `result` as completed and ask for the next step.
fn complete(
    navigator: &mut TrackedItemsStepNavigator,
    task: &mut TaskResult,
    result: StepResult,
) -> (Option<String>, NavigationDirection) {
    let identifier = result.identifier.clone();
    task.append_step_history(result);
    let (next, direction) = navigator.step_after(Some(&identifier), task);
    (next.map(|s| s.identifier().to_string()), direction)
}

fn start(navigator: &mut TrackedItemsStepNavigator, task: &mut TaskResult) -> Option<String> {
    let (next, _) = navigator.step_after(None, task);
    next.map(|s| s.identifier().to_string())
}

fn dose(value: i64) -> Map<String, Value> {
    let mut values = Map::new();
    values.insert("dose".to_string(), json!(value));
    values
}

fn details(identifier: &str, values: Map<String, Value>) -> StepResult {
    StepResult::new(identifier, StepOutcome::Details { values })
}

fn review(navigator: &mut TrackedItemsStepNavigator) -> StepResult {
    let collection = navigator.in_memory_result().copy_with("review");
    StepResult::new("review", StepOutcome::Collection(collection))
}

#[test]
fn test_selection_without_review_goes_to_logging() {
    let catalog = TrackedCatalog::new(
        vec![TrackedItem::new("A"), TrackedItem::new("B"), TrackedItem::new("C")],
        None,
    )
    .unwrap();
    let mut navigator = TrackedItemsStepNavigator::with_builder("medication", catalog, &DefaultStepBuilder);
    let mut task = TaskResult::new("medication");

    assert_eq!(start(&mut navigator, &mut task).as_deref(), Some("selection"));
    let (next, direction) = complete(
        &mut navigator,
        &mut task,
        StepResult::selection("selection", ["A", "C"]),
    );
    assert_eq!(next.as_deref(), Some("logging"));
    assert_eq!(direction, NavigationDirection::Forward);

    let (next, _) = complete(
        &mut navigator,
        &mut task,
        StepResult::new("logging", StepOutcome::Logging { entries: Vec::new() }),
    );
    assert_eq!(next, None);
}

#[test]
fn test_review_details_then_exit() {
    let mut navigator = detailed(vec![medication("A"), TrackedItem::new("B")]);
    let mut task = TaskResult::new("medication");

    start(&mut navigator, &mut task);
    let (next, _) = complete(
        &mut navigator,
        &mut task,
        StepResult::selection("selection", ["A", "B"]),
    );
    assert_eq!(next.as_deref(), Some("review"));

    let reviewed = review(&mut navigator);
    let (next, _) = complete(&mut navigator, &mut task, reviewed);
    assert_eq!(next.as_deref(), Some("A"));

    let (next, _) = complete(&mut navigator, &mut task, details("A", dose(5)));
    assert_eq!(next.as_deref(), Some("review"));

    let reviewed = review(&mut navigator);
    let (next, direction) = complete(&mut navigator, &mut task, reviewed);
    assert_eq!(next, None);
    assert_eq!(direction, NavigationDirection::Forward);
    assert!(navigator.in_memory_result().has_required_values());
}

#[test]
fn test_prior_data_starts_at_logging() {
    let mut navigator = detailed(vec![medication("A"), medication("B")]);
    let mut source = HashMap::new();
    source.insert(
        "medication".to_string(),
        json!({
            "selectedIdentifiers": ["B"],
            "selectedAnswers": [{ "identifier": "B", "dose": 10 }]
        }),
    );
    navigator.setup_tracking(TaskContext::new("medication", uuid::Uuid::new_v4()), &source);

    let mut task = TaskResult::new("medication");
    assert_eq!(start(&mut navigator, &mut task).as_deref(), Some("logging"));
    assert!(!navigator.has_step_after(Some("logging")));
}

#[test]
fn test_malformed_prior_data_is_ignored() {
    let mut navigator = detailed(vec![medication("A")]);
    let mut source = HashMap::new();
    source.insert("medication".to_string(), json!({ "selectedIdentifiers": "A" }));
    navigator.setup_tracking(TaskContext::new("medication", uuid::Uuid::new_v4()), &source);

    assert!(!navigator.has_previous_client_data());
    let mut task = TaskResult::new("medication");
    assert_eq!(start(&mut navigator, &mut task).as_deref(), Some("selection"));
    assert!(navigator.in_memory_result().selected_identifiers().is_empty());
}

#[test]
fn test_remove_item_from_detail_reverses() {
    let mut navigator = detailed(vec![medication("A"), medication("B")]);
    let mut task = TaskResult::new("medication");

    start(&mut navigator, &mut task);
    complete(
        &mut navigator,
        &mut task,
        StepResult::selection("selection", ["A", "B"]),
    );
    let reviewed = review(&mut navigator);
    complete(&mut navigator, &mut task, reviewed);
    let (next, _) = complete(&mut navigator, &mut task, details("A", dose(1)));
    assert_eq!(next.as_deref(), Some("B"));

    let (next, direction) = complete(
        &mut navigator,
        &mut task,
        StepResult::remove_items("B", ["B"]),
    );
    assert_eq!(direction, NavigationDirection::Reverse);
    assert_eq!(next.as_deref(), Some("review"));
    assert_eq!(
        navigator.in_memory_result().selected_identifiers(),
        ["A".to_string()].as_slice()
    );
    assert!(navigator.detail_step("B").is_none());
}

#[test]
fn test_empty_review_returns_to_selection() {
    let mut navigator = detailed(vec![medication("A"), medication("B")]);
    let mut task = TaskResult::new("medication");

    start(&mut navigator, &mut task);
    complete(
        &mut navigator,
        &mut task,
        StepResult::selection("selection", ["A", "B"]),
    );
    let emptied = TrackedItemsCollectionResult::new("review");
    let (next, _) = complete(
        &mut navigator,
        &mut task,
        StepResult::new("review", StepOutcome::Collection(emptied)),
    );
    assert_eq!(next.as_deref(), Some("selection"));
}

#[test]
fn test_review_goes_to_reminder_without_prior_data() {
    let catalog = TrackedCatalog::new(vec![medication("A")], None).unwrap();
    let builder = DetailedStepBuilder::new().with_reminder([15, 30]);
    let mut navigator = TrackedItemsStepNavigator::with_builder("medication", catalog, &builder);
    let mut task = TaskResult::new("medication");

    start(&mut navigator, &mut task);
    complete(&mut navigator, &mut task, StepResult::selection("selection", ["A"]));
    let reviewed = review(&mut navigator);
    complete(&mut navigator, &mut task, reviewed);
    complete(&mut navigator, &mut task, details("A", dose(2)));
    let reviewed = review(&mut navigator);
    let (next, _) = complete(&mut navigator, &mut task, reviewed);
    assert_eq!(next.as_deref(), Some("reminder"));

    let (next, _) = complete(
        &mut navigator,
        &mut task,
        StepResult::new("reminder", StepOutcome::Answer { value: json!(15) }),
    );
    assert_eq!(next, None);
}

#[test]
fn test_reminder_without_review_goes_to_logging() {
    let mut navigator = TrackedItemsStepNavigator::from_value(json!({
        "identifier": "medication",
        "items": [{ "identifier": "A" }],
        "reminder": { "type": "trackedItemReminders", "reminderChoices": [15] }
    }))
    .unwrap();
    assert!(navigator.review_step().is_none());
    let mut task = TaskResult::new("medication");

    start(&mut navigator, &mut task);
    complete(&mut navigator, &mut task, StepResult::selection("selection", ["A"]));
    let (next, _) = complete(
        &mut navigator,
        &mut task,
        StepResult::new("reminder", StepOutcome::Answer { value: json!(15) }),
    );
    assert_eq!(next.as_deref(), Some("logging"));
}

#[test]
fn test_jump_target_wins_when_it_resolves() {
    let mut navigator = detailed(vec![medication("A")]);
    let mut task = TaskResult::new("medication");

    start(&mut navigator, &mut task);
    let (next, _) = complete(
        &mut navigator,
        &mut task,
        StepResult::selection("selection", ["A"]).with_skip_to("logging"),
    );
    assert_eq!(next.as_deref(), Some("logging"));

    let (next, _) = complete(
        &mut navigator,
        &mut task,
        StepResult::new("logging", StepOutcome::Logging { entries: Vec::new() })
            .with_skip_to("selection"),
    );
    assert_eq!(next.as_deref(), Some("selection"));

    let (next, _) = complete(
        &mut navigator,
        &mut task,
        StepResult::selection("selection", ["A"]).with_skip_to("nowhere"),
    );
    assert_eq!(next.as_deref(), Some("review"));
}

#[test]
fn test_configured_next_step_identifier() {
    let mut navigator = TrackedItemsStepNavigator::from_value(json!({
        "identifier": "medication",
        "items": [{ "identifier": "A" }],
        "review": { "type": "review" },
        "selection": { "nextStepIdentifier": "logging" }
    }))
    .unwrap();
    let mut task = TaskResult::new("medication");

    start(&mut navigator, &mut task);
    let (next, _) = complete(&mut navigator, &mut task, StepResult::selection("selection", ["A"]));
    assert_eq!(next.as_deref(), Some("logging"));
}

#[test]
fn test_lookahead_finds_the_one_incomplete_item() {
    let ids = ["A", "B", "C", "D"];
    for k in 0..ids.len() {
        let mut navigator = detailed(ids.iter().map(|id| medication(id)).collect());
        let mut task = TaskResult::new("medication");
        let answers: Vec<Value> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                if i == k {
                    json!({ "identifier": id })
                } else {
                    json!({ "identifier": id, "dose": 1 })
                }
            })
            .collect();
        let reviewed: TrackedItemsCollectionResult =
            serde_json::from_value(json!({ "identifier": "review", "selectedAnswers": answers }))
                .unwrap();

        let (next, _) = complete(
            &mut navigator,
            &mut task,
            StepResult::new("review", StepOutcome::Collection(reviewed)),
        );
        assert_eq!(next.as_deref(), Some(ids[k]));

        for (i, id) in ids.iter().enumerate().filter(|(i, _)| *i != k) {
            let (next, _) = complete(&mut navigator, &mut task, details(id, Map::new()));
            assert_eq!(next.as_deref(), Some(ids[k]), "start {i} target {k}");
        }

        let (next, _) = complete(&mut navigator, &mut task, details(ids[k], dose(3)));
        assert_eq!(next.as_deref(), Some("review"));
    }
}

#[test]
fn test_reorder_keeps_answers() {
    let mut navigator = detailed(vec![medication("A"), medication("B")]);
    let mut task = TaskResult::new("medication");

    complete(
        &mut navigator,
        &mut task,
        StepResult::selection("selection", ["A", "B"]),
    );
    complete(&mut navigator, &mut task, details("A", dose(7)));
    complete(
        &mut navigator,
        &mut task,
        StepResult::selection("selection", ["B", "A"]),
    );

    let result = navigator.in_memory_result();
    assert_eq!(
        result.selected_identifiers(),
        ["B".to_string(), "A".to_string()].as_slice()
    );
    assert_eq!(result.answer("A").unwrap().values.get("dose"), Some(&json!(7)));
}

#[test]
fn test_export_then_import_round_trip() {
    let mut navigator = detailed(vec![medication("A"), medication("B"), TrackedItem::new("C")]);
    let mut task = TaskResult::new("medication");
    complete(
        &mut navigator,
        &mut task,
        StepResult::selection("selection", ["C", "A"]),
    );
    complete(&mut navigator, &mut task, details("A", dose(4)));

    let exported = navigator.export_client_data().unwrap();
    let published = task.find_async_result("medication").unwrap();
    assert!(matches!(&published.outcome, StepOutcome::Collection(c) if c.selected_identifiers().len() == 2));

    let mut restored = detailed(vec![medication("A"), medication("B"), TrackedItem::new("C")]);
    restored.set_previous_client_data(exported).unwrap();

    let before = navigator.in_memory_result().clone();
    let after = restored.in_memory_result();
    assert_eq!(after.selected_identifiers(), before.selected_identifiers());
    assert_eq!(after.selected_answers(), before.selected_answers());
}

#[test]
fn test_skipped_step_in_subtask() {
    let mut navigator = TrackedItemsStepNavigator::from_value(json!({
        "identifier": "medication",
        "items": [{ "identifier": "A" }],
        "review": { "type": "review", "skipRule": "always" }
    }))
    .unwrap();
    let context = TaskContext::new("medication", uuid::Uuid::new_v4()).with_parent("study");
    navigator.setup_tracking(context, &HashMap::<String, Value>::new());

    let mut task = TaskResult::new("medication");
    start(&mut navigator, &mut task);
    let (next, _) = complete(&mut navigator, &mut task, StepResult::selection("selection", ["A"]));
    assert_eq!(next, None);
    assert!(navigator.should_skip("review"));
    assert!(!navigator.should_skip("selection"));
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "must report a collection result")]
fn test_review_without_collection_asserts() {
    let mut navigator = detailed(vec![medication("A")]);
    let mut task = TaskResult::new("medication");
    complete(&mut navigator, &mut task, StepResult::selection("review", ["A"]));
}
