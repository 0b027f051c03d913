//! Fetching the remote task snapshot for one run.
//!
//! Remote failures never abort a run: each call site degrades to an empty
//! result and logs a warning.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::clock::RunClock;
use crate::core::types::{Task, TaskSnapshot};
use crate::io::config::TodoistConfig;
use crate::io::todoist::TaskSource;

/// Open tasks across `filters`, in filter order, first occurrence of each id kept.
pub fn fetch_open_tasks<S: TaskSource + ?Sized>(source: &S, filters: &[String]) -> Vec<Task> {
    let mut seen = HashSet::new();
    let mut tasks = Vec::new();
    for filter in filters {
        let fetched = source.tasks(filter).unwrap_or_else(|err| {
            warn!(filter = %filter, error = %format!("{err:#}"), "task fetch failed; treating as empty");
            Vec::new()
        });
        for task in fetched {
            if seen.insert(task.id.clone()) {
                tasks.push(task);
            }
        }
    }
    tasks
}

/// Open tasks plus, when enabled, today's completed items.
pub fn fetch_snapshot<S: TaskSource + ?Sized>(
    source: &S,
    cfg: &TodoistConfig,
    clock: &RunClock,
) -> TaskSnapshot {
    let open = fetch_open_tasks(source, &cfg.filters);
    let completed = if cfg.include_completed {
        let window = clock.completed_window(cfg.completed_limit);
        source.completed(&window).unwrap_or_else(|err| {
            warn!(error = %format!("{err:#}"), "completed fetch failed; treating as empty");
            Vec::new()
        })
    } else {
        Vec::new()
    };
    info!(open = open.len(), completed = completed.len(), "fetched task snapshot");
    TaskSnapshot { open, completed }
}
