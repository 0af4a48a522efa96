//! What the navigator knows about the task run it is part of.

use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Lookup of previously persisted client data, keyed by activity identifier.
///
/// Implemented by the host's configuration or schedule store. Returned values
/// are treated as immutable snapshots.
pub trait ClientDataSource: Send + Sync {
    fn client_data(&self, activity_identifier: &str) -> Option<Value>;
}

impl ClientDataSource for HashMap<String, Value> {
    fn client_data(&self, activity_identifier: &str) -> Option<Value> {
        self.get(activity_identifier).cloned()
    }
}

/// Handle to the running task, held by value.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskContext {
    /// Identifier of the running task
    pub task_identifier: String,
    /// Run identifier shared with the task result
    pub task_run_uuid: Uuid,
    /// Identifier of the enclosing task when run as a sub-flow
    pub parent_identifier: Option<String>,
}

impl TaskContext {
    pub fn new(task_identifier: impl Into<String>, task_run_uuid: Uuid) -> Self {
        Self {
            task_identifier: task_identifier.into(),
            task_run_uuid,
            parent_identifier: None,
        }
    }

    /// Builder: mark as embedded in a parent task.
    pub fn with_parent(mut self, parent_identifier: impl Into<String>) -> Self {
        self.parent_identifier = Some(parent_identifier.into());
        self
    }

    pub fn is_subtask(&self) -> bool {
        self.parent_identifier.is_some()
    }
}
