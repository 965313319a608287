// Notification Domain Model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Structured context attached to a notification
pub type NotificationContext = BTreeMap<String, serde_json::Value>;

/// Lifecycle tag carried by every notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "command.started")]
    CommandStarted,
    #[serde(rename = "command.completed")]
    CommandCompleted,
    #[serde(rename = "task.started")]
    TaskStarted,
    #[serde(rename = "task.completed")]
    TaskCompleted,
    #[serde(rename = "task.error")]
    TaskError,
    #[serde(rename = "task.comment")]
    TaskComment,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CommandStarted => "command.started",
            Action::CommandCompleted => "command.completed",
            Action::TaskStarted => "task.started",
            Action::TaskCompleted => "task.completed",
            Action::TaskError => "task.error",
            Action::TaskComment => "task.comment",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single lifecycle or progress message.
///
/// `silent` marks the message as routine noise: a silent run drops it,
/// a verbose run delivers it like any other message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub run_id: String,
    pub message: String,
    pub context: NotificationContext,
    pub action: Action,
    pub silent: bool,
}

impl Notification {
    pub fn new(run_id: impl Into<String>, action: Action, message: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            message: message.into(),
            context: NotificationContext::new(),
            action,
            silent: false,
        }
    }

    /// Routine comment (`task.comment`, silent)
    pub fn comment(run_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(run_id, Action::TaskComment, message).silenced()
    }

    pub fn silenced(mut self) -> Self {
        self.silent = true;
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}
