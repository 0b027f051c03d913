//! Test-only fakes and fixtures for the sync pipelines.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Result, anyhow};
use chrono::DateTime;

use crate::clock::RunClock;
use crate::core::types::{CompletedItem, Due, Task};
use crate::io::config::SyncConfig;
use crate::io::relay::{RelayFile, RelayStore};
use crate::io::todoist::{CompletedWindow, TaskSource};

/// Create an open task with no due date or project.
pub fn task(id: &str, content: &str) -> Task {
    Task {
        id: id.to_string(),
        content: content.to_string(),
        is_completed: false,
        due: None,
        project_id: None,
    }
}

/// Create an open task due on `date` (`YYYY-MM-DD`).
pub fn task_due(id: &str, content: &str, date: &str) -> Task {
    Task {
        due: Some(Due {
            date: date.to_string(),
        }),
        ..task(id, content)
    }
}

pub fn completed_item(content: &str, completed_at: Option<&str>) -> CompletedItem {
    CompletedItem {
        task_id: None,
        content: content.to_string(),
        completed_at: completed_at.map(str::to_string),
        project_id: None,
    }
}

/// Clock pinned to 2024-05-01 08:00 at +09:00.
pub fn fixed_clock() -> RunClock {
    RunClock::at(DateTime::parse_from_rfc3339("2024-05-01T08:00:00+09:00").unwrap())
}

/// Default config with the journal and status record rooted under `dir`.
pub fn config_in(dir: &Path) -> SyncConfig {
    let mut cfg = SyncConfig::default();
    cfg.journal.root = dir.join("journal");
    cfg.journal.status_path = dir.join("sync_data.json");
    cfg
}

#[derive(Default)]
struct SourceState {
    by_filter: Vec<(String, Vec<Task>)>,
    completed: Vec<CompletedItem>,
    tasks_status: Option<u16>,
    completed_status: Option<u16>,
    close_failures: HashSet<String>,
    queried: Vec<String>,
    closed: Vec<String>,
}

/// [`TaskSource`] that serves scripted tasks.
///
/// Closing a task removes it from every filter and appends it to the
/// completed items, so a later fetch in the same run sees the change.
#[derive(Default)]
pub struct ScriptedTaskSource {
    state: RefCell<SourceState>,
}

impl ScriptedTaskSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(self, filter: &str, tasks: Vec<Task>) -> Self {
        self.state
            .borrow_mut()
            .by_filter
            .push((filter.to_string(), tasks));
        self
    }

    pub fn with_completed(self, items: Vec<CompletedItem>) -> Self {
        self.state.borrow_mut().completed = items;
        self
    }

    /// Every `tasks` call answers with HTTP `status`.
    pub fn failing_tasks(self, status: u16) -> Self {
        self.state.borrow_mut().tasks_status = Some(status);
        self
    }

    /// Every `completed` call answers with HTTP `status`.
    pub fn failing_completed(self, status: u16) -> Self {
        self.state.borrow_mut().completed_status = Some(status);
        self
    }

    pub fn failing_close(self, task_id: &str) -> Self {
        self.state
            .borrow_mut()
            .close_failures
            .insert(task_id.to_string());
        self
    }

    pub fn queried_filters(&self) -> Vec<String> {
        self.state.borrow().queried.clone()
    }

    pub fn closed(&self) -> Vec<String> {
        self.state.borrow().closed.clone()
    }
}

impl TaskSource for ScriptedTaskSource {
    fn tasks(&self, filter: &str) -> Result<Vec<Task>> {
        let mut state = self.state.borrow_mut();
        state.queried.push(filter.to_string());
        if let Some(status) = state.tasks_status {
            return Err(anyhow!("GET tasks returned HTTP {status}"));
        }
        Ok(state
            .by_filter
            .iter()
            .find(|(f, _)| f == filter)
            .map(|(_, tasks)| tasks.clone())
            .unwrap_or_default())
    }

    fn completed(&self, _window: &CompletedWindow) -> Result<Vec<CompletedItem>> {
        let state = self.state.borrow();
        if let Some(status) = state.completed_status {
            return Err(anyhow!("GET completed returned HTTP {status}"));
        }
        Ok(state.completed.clone())
    }

    fn close(&self, task_id: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.close_failures.contains(task_id) {
            return Err(anyhow!("POST close returned HTTP 500"));
        }
        let mut closed: Option<Task> = None;
        for (_, tasks) in &mut state.by_filter {
            if let Some(pos) = tasks.iter().position(|t| t.id == task_id) {
                closed = Some(tasks.remove(pos));
            }
        }
        let closed = closed.ok_or_else(|| anyhow!("POST close returned HTTP 404"))?;
        state.completed.push(CompletedItem {
            task_id: Some(closed.id.clone()),
            content: closed.content,
            completed_at: None,
            project_id: closed.project_id,
        });
        state.closed.push(task_id.to_string());
        Ok(())
    }
}

/// A recorded [`RelayStore::put`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPut {
    pub path: String,
    pub message: String,
    pub content: String,
    pub sha: Option<String>,
}

/// In-memory [`RelayStore`] that checks revision ids like the real service.
#[derive(Default)]
pub struct MemoryRelay {
    files: RefCell<HashMap<String, RelayFile>>,
    puts: RefCell<Vec<RecordedPut>>,
    revision: RefCell<u32>,
    fail: bool,
}

impl MemoryRelay {
    /// Relay whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        let sha = self.next_sha();
        self.files.borrow_mut().insert(
            path.to_string(),
            RelayFile {
                content: content.to_string(),
                sha,
            },
        );
        self
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.files.borrow().get(path).map(|f| f.content.clone())
    }

    pub fn sha(&self, path: &str) -> Option<String> {
        self.files.borrow().get(path).map(|f| f.sha.clone())
    }

    pub fn puts(&self) -> Vec<RecordedPut> {
        self.puts.borrow().clone()
    }

    fn next_sha(&self) -> String {
        let mut revision = self.revision.borrow_mut();
        *revision += 1;
        format!("sha-{revision}")
    }
}

impl RelayStore for MemoryRelay {
    fn get(&self, path: &str) -> Result<Option<RelayFile>> {
        if self.fail {
            return Err(anyhow!("GET contents returned HTTP 503"));
        }
        Ok(self.files.borrow().get(path).cloned())
    }

    fn put(&self, path: &str, message: &str, content: &str, sha: Option<&str>) -> Result<()> {
        if self.fail {
            return Err(anyhow!("PUT contents returned HTTP 503"));
        }
        let current = self.sha(path);
        if current.as_deref() != sha {
            return Err(anyhow!("PUT contents returned HTTP 409: sha mismatch"));
        }
        self.puts.borrow_mut().push(RecordedPut {
            path: path.to_string(),
            message: message.to_string(),
            content: content.to_string(),
            sha: sha.map(str::to_string),
        });
        let sha = self.next_sha();
        self.files.borrow_mut().insert(
            path.to_string(),
            RelayFile {
                content: content.to_string(),
                sha,
            },
        );
        Ok(())
    }
}
