//! Shared types for task snapshots and sync bookkeeping.
//!
//! Task shapes mirror the remote service's JSON so they can be deserialized
//! directly; unknown fields are ignored.

use serde::{Deserialize, Serialize};

/// Open task as returned by `GET tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub due: Option<Due>,
    #[serde(default)]
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Due {
    /// Calendar date (`YYYY-MM-DD`).
    pub date: String,
}

/// Item from the completed-tasks endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedItem {
    #[serde(default)]
    pub task_id: Option<String>,
    pub content: String,
    /// RFC 3339 completion timestamp; kept as text because it may not parse.
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

/// Point-in-time view of the remote task list used for one render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub open: Vec<Task>,
    pub completed: Vec<CompletedItem>,
}

impl TaskSnapshot {
    /// Number of tasks the rendered section will list.
    pub fn len(&self) -> usize {
        self.open.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome flag recorded in the status record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    /// The run aborted before the authoritative write landed.
    Failed,
}

impl SyncStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncStatus::Success => "success",
            SyncStatus::Failed => "failed",
        }
    }
}
