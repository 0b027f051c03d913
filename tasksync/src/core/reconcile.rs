//! Planning which remote tasks to close from journal check marks.

use std::collections::{HashMap, HashSet};

use crate::core::checklist::{AnnotationStripper, ChecklistLine};
use crate::core::types::Task;

/// A remote task the journal shows as done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedClose {
    pub task_id: String,
    pub content: String,
}

/// Tasks checked in the journal that are still open remotely.
///
/// A line matches a task whose content equals the line text as written, or
/// failing that, the text with renderer annotations stripped. When several
/// open tasks share content the first one wins.
/// Each task id is planned at most once, in journal order.
pub fn plan_completions(
    lines: &[ChecklistLine],
    open: &[Task],
    stripper: &AnnotationStripper,
) -> Vec<PlannedClose> {
    let mut by_content: HashMap<&str, &Task> = HashMap::new();
    for task in open {
        by_content.entry(task.content.as_str()).or_insert(task);
    }

    let mut seen = HashSet::new();
    let mut planned = Vec::new();
    for line in lines.iter().filter(|l| l.checked) {
        let text = line.text.trim();
        let Some(task) = by_content
            .get(text)
            .or_else(|| by_content.get(stripper.content(text)))
        else {
            continue;
        };
        if task.is_completed || !seen.insert(task.id.as_str()) {
            continue;
        }
        planned.push(PlannedClose {
            task_id: task.id.clone(),
            content: task.content.clone(),
        });
    }
    planned
}
