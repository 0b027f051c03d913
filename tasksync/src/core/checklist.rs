//! Parsing checklist lines back out of a section body.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::core::render::RenderLabels;

static ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^- \[([ xX])\](?:\s+(.*))?$").unwrap());

/// One `- [ ] text` / `- [x] text` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistLine {
    pub checked: bool,
    pub text: String,
}

impl ChecklistLine {
    pub fn render(&self) -> String {
        let mark = if self.checked { 'x' } else { ' ' };
        if self.text.is_empty() {
            format!("- [{mark}]")
        } else {
            format!("- [{mark}] {}", self.text)
        }
    }
}

/// Parse the checklist items in `body`.
///
/// Lines are trimmed. A non-empty line that is not a checklist item is a
/// wrapped continuation and is joined onto the preceding item with a space;
/// anything before the first item is ignored.
pub fn parse_checklist(body: &str) -> Vec<ChecklistLine> {
    let mut items: Vec<ChecklistLine> = Vec::new();
    for raw in body.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(caps) = ITEM_RE.captures(line) {
            items.push(ChecklistLine {
                checked: &caps[1] != " ",
                text: caps
                    .get(2)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default(),
            });
        } else if let Some(last) = items.last_mut() {
            if !last.text.is_empty() {
                last.text.push(' ');
            }
            last.text.push_str(line);
        }
    }
    items
}

/// Strips the annotations the renderer appends, recovering task content.
#[derive(Debug, Clone)]
pub struct AnnotationStripper {
    re: Regex,
}

impl AnnotationStripper {
    pub fn new(labels: &RenderLabels) -> Result<Self> {
        let mut status = Vec::new();
        if !labels.completed_marker.is_empty() {
            status.push(format!(
                r"{}(?:\s+\d{{1,2}}:\d{{2}})?",
                regex::escape(&labels.completed_marker)
            ));
        }
        if !labels.due_today_marker.is_empty() {
            status.push(regex::escape(&labels.due_today_marker));
        }
        if !labels.due_label.is_empty() {
            status.push(format!(r"\({}: [^)]*\)", regex::escape(&labels.due_label)));
        }

        let mut pattern = String::from(r"^(?P<content>.*?)");
        if !status.is_empty() {
            pattern.push_str(&format!(r"(?:\s+(?:{}))?", status.join("|")));
        }
        if !labels.project_label.is_empty() {
            pattern.push_str(&format!(
                r"(?:\s+\[{}: [^\]]*\])?",
                regex::escape(&labels.project_label)
            ));
        }
        pattern.push('$');

        let re = Regex::new(&pattern).context("compile annotation pattern")?;
        Ok(Self { re })
    }

    /// Task content of a rendered line's text.
    pub fn content<'a>(&self, text: &'a str) -> &'a str {
        let text = text.trim();
        self.re
            .captures(text)
            .and_then(|caps| caps.name("content"))
            .map_or(text, |m| m.as_str().trim_end())
    }
}
