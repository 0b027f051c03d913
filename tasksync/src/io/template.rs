//! Document templates for new journal entries and relay documents.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use regex::Regex;

/// Skeleton used for a journal entry that does not exist yet.
pub const JOURNAL_SKELETON: &str = include_str!("templates/journal.md");
/// Layout of the document the cloud run stores on the relay.
pub const RELAY_DOCUMENT: &str = include_str!("templates/relay.md");

static FOOTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\*Last updated: [^\r\n]*\*").unwrap());

/// Values available to document templates.
#[derive(Debug, Clone)]
pub struct DocumentVars<'a> {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub task_header: &'a str,
    pub tasks: &'a str,
    /// Line that closes the task section; must be one of the configured terminators.
    pub terminator: &'a str,
    pub updated_at: String,
    /// Which run wrote the document, e.g. `Local Sync`.
    pub source: &'a str,
}

/// Render `source` with `vars`. Output keeps the template's trailing newline.
pub fn render_document(source: &str, vars: &DocumentVars<'_>) -> Result<String> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.render_str(
        source,
        context! {
            date => vars.date,
            task_header => vars.task_header,
            tasks => vars.tasks,
            terminator => vars.terminator,
            updated_at => vars.updated_at,
            source => vars.source,
        },
    )
    .context("render document template")
}

/// Rewrite the last `*Last updated: ...*` line of a rendered document.
///
/// Documents without the footer are returned unchanged.
pub fn refresh_footer(text: &str, updated_at: &str, source: &str) -> String {
    let Some(found) = FOOTER_RE.find_iter(text).last() else {
        return text.to_string();
    };
    format!(
        "{}*Last updated: {updated_at} ({source})*{}",
        &text[..found.start()],
        &text[found.end()..]
    )
}

/// Journal skeleton from `path`, or the built-in one.
pub fn load_skeleton(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("read skeleton template {}", path.display())),
        None => Ok(JOURNAL_SKELETON.to_string()),
    }
}
