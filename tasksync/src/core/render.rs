//! Checklist rendering for task snapshots.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::core::types::{CompletedItem, Task, TaskSnapshot};

/// Literal strings used when rendering (and later stripping) checklist lines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RenderLabels {
    /// Single line written when there is nothing to list.
    pub placeholder: String,
    /// Appended to open tasks due today.
    pub due_today_marker: String,
    /// Label inside the due-date parenthetical, e.g. `(due: 2024-05-01)`.
    pub due_label: String,
    /// Label inside the project annotation, e.g. `[project: 42]`.
    pub project_label: String,
    /// Appended to completed tasks, followed by `HH:MM` when known.
    pub completed_marker: String,
}

impl Default for RenderLabels {
    fn default() -> Self {
        Self {
            placeholder: "No tasks".to_string(),
            due_today_marker: "🔥".to_string(),
            due_label: "due".to_string(),
            project_label: "project".to_string(),
            completed_marker: "✅".to_string(),
        }
    }
}

/// Per-run inputs that make rendering deterministic.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext {
    pub today: NaiveDate,
    /// Offset completion times are shown in.
    pub offset: FixedOffset,
}

/// Render a snapshot as checklist lines.
///
/// Open tasks come first, then completed ones, each group in source order.
/// An empty snapshot renders as the single placeholder line.
pub fn render_checklist(
    snapshot: &TaskSnapshot,
    ctx: &RenderContext,
    labels: &RenderLabels,
) -> Vec<String> {
    let mut open = Vec::new();
    let mut done = Vec::new();
    for task in &snapshot.open {
        if task.is_completed {
            // No completion time on the open-task shape.
            done.push(completed_line(
                &task.content,
                None,
                task.project_id.as_deref(),
                labels,
            ));
        } else {
            open.push(open_line(task, ctx, labels));
        }
    }
    for item in &snapshot.completed {
        done.push(completed_item_line(item, ctx, labels));
    }

    if open.is_empty() && done.is_empty() {
        return vec![labels.placeholder.clone()];
    }
    open.extend(done);
    open
}

/// Render a snapshot as a section body (lines joined with `\n`).
pub fn render_body(snapshot: &TaskSnapshot, ctx: &RenderContext, labels: &RenderLabels) -> String {
    render_checklist(snapshot, ctx, labels).join("\n")
}

fn open_line(task: &Task, ctx: &RenderContext, labels: &RenderLabels) -> String {
    let mut line = format!("- [ ] {}", task.content);
    if let Some(due) = &task.due {
        if is_today(&due.date, ctx.today) {
            line.push(' ');
            line.push_str(&labels.due_today_marker);
        } else {
            line.push_str(&format!(" ({}: {})", labels.due_label, due.date));
        }
    }
    push_project(&mut line, task.project_id.as_deref(), labels);
    line
}

fn completed_item_line(item: &CompletedItem, ctx: &RenderContext, labels: &RenderLabels) -> String {
    let time = item
        .completed_at
        .as_deref()
        .and_then(|raw| completion_time(raw, ctx.offset));
    completed_line(
        &item.content,
        time.as_deref(),
        item.project_id.as_deref(),
        labels,
    )
}

fn completed_line(
    content: &str,
    time: Option<&str>,
    project_id: Option<&str>,
    labels: &RenderLabels,
) -> String {
    let mut line = format!("- [x] {} {}", content, labels.completed_marker);
    if let Some(time) = time {
        line.push(' ');
        line.push_str(time);
    }
    push_project(&mut line, project_id, labels);
    line
}

fn push_project(line: &mut String, project_id: Option<&str>, labels: &RenderLabels) {
    if let Some(project) = project_id.filter(|p| !p.is_empty()) {
        line.push_str(&format!(" [{}: {}]", labels.project_label, project));
    }
}

fn is_today(date: &str, today: NaiveDate) -> bool {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok_and(|d| d == today)
}

/// Format an RFC 3339 timestamp as `HH:MM` in `offset`, or `None` if unparsable.
pub fn completion_time(raw: &str, offset: FixedOffset) -> Option<String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|ts| ts.with_timezone(&offset).format("%H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Due;

    fn ctx() -> RenderContext {
        RenderContext {
            today: NaiveDate::from_ymd_opt(2024, 5, 1).expect("date"),
            offset: FixedOffset::east_opt(9 * 3600).expect("offset"),
        }
    }

    fn task(id: &str, content: &str) -> Task {
        Task {
            id: id.to_string(),
            content: content.to_string(),
            is_completed: false,
            due: None,
            project_id: None,
        }
    }

    fn done(content: &str, completed_at: Option<&str>) -> CompletedItem {
        CompletedItem {
            task_id: None,
            content: content.to_string(),
            completed_at: completed_at.map(str::to_string),
            project_id: None,
        }
    }

    #[test]
    fn empty_snapshot_renders_placeholder() {
        let lines = render_checklist(&TaskSnapshot::default(), &ctx(), &RenderLabels::default());
        assert_eq!(lines, vec!["No tasks".to_string()]);
    }

    #[test]
    fn due_today_gets_marker_without_date() {
        let mut milk = task("1", "Buy milk");
        milk.due = Some(Due {
            date: "2024-05-01".to_string(),
        });
        let snapshot = TaskSnapshot {
            open: vec![milk],
            completed: Vec::new(),
        };
        let lines = render_checklist(&snapshot, &ctx(), &RenderLabels::default());
        assert_eq!(lines, vec!["- [ ] Buy milk 🔥".to_string()]);
    }

    #[test]
    fn other_due_date_and_project_are_annotated() {
        let mut rent = task("2", "Pay rent");
        rent.due = Some(Due {
            date: "2024-05-03".to_string(),
        });
        rent.project_id = Some("42".to_string());
        let snapshot = TaskSnapshot {
            open: vec![rent],
            completed: Vec::new(),
        };
        let lines = render_checklist(&snapshot, &ctx(), &RenderLabels::default());
        assert_eq!(
            lines,
            vec!["- [ ] Pay rent (due: 2024-05-03) [project: 42]".to_string()]
        );
    }

    #[test]
    fn completed_time_is_shown_in_run_offset() {
        let snapshot = TaskSnapshot {
            open: Vec::new(),
            completed: vec![done("Stretch", Some("2024-05-01T00:30:00.000000Z"))],
        };
        let lines = render_checklist(&snapshot, &ctx(), &RenderLabels::default());
        assert_eq!(lines, vec!["- [x] Stretch ✅ 09:30".to_string()]);
    }

    #[test]
    fn unparsable_completion_time_falls_back_to_bare_marker() {
        let snapshot = TaskSnapshot {
            open: Vec::new(),
            completed: vec![done("Stretch", Some("yesterday-ish"))],
        };
        let lines = render_checklist(&snapshot, &ctx(), &RenderLabels::default());
        assert_eq!(lines, vec!["- [x] Stretch ✅".to_string()]);
    }

    #[test]
    fn open_precede_completed_and_source_order_is_kept() {
        let mut closed = task("3", "Already closed");
        closed.is_completed = true;
        let snapshot = TaskSnapshot {
            open: vec![task("b", "Second"), closed, task("a", "First")],
            completed: vec![done("Done one", None), done("Done two", None)],
        };
        let lines = render_checklist(&snapshot, &ctx(), &RenderLabels::default());
        assert_eq!(
            lines,
            vec![
                "- [ ] Second".to_string(),
                "- [ ] First".to_string(),
                "- [x] Already closed ✅".to_string(),
                "- [x] Done one ✅".to_string(),
                "- [x] Done two ✅".to_string(),
            ]
        );
    }

    #[test]
    fn render_body_joins_lines() {
        let snapshot = TaskSnapshot {
            open: vec![task("1", "One"), task("2", "Two")],
            completed: Vec::new(),
        };
        assert_eq!(
            render_body(&snapshot, &ctx(), &RenderLabels::default()),
            "- [ ] One\n- [ ] Two"
        );
    }
}
