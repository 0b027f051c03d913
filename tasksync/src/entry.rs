//! Updating today's journal entry with a new task section body.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::clock::RunClock;
use crate::core::section;
use crate::io::config::JournalConfig;
use crate::io::journal::write_entry;
use crate::io::template::{DocumentVars, load_skeleton, refresh_footer, render_document};

/// Whether the entry existed before the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryWrite {
    Created,
    Updated,
}

impl EntryWrite {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryWrite::Created => "created",
            EntryWrite::Updated => "updated",
        }
    }
}

/// Full entry text with the task section body replaced by `body`.
///
/// A missing entry is rendered from the configured skeleton. An existing
/// entry also gets its `Last updated` footer rewritten, if it has one.
pub fn compose_entry(
    existing: Option<&str>,
    cfg: &JournalConfig,
    clock: &RunClock,
    body: &str,
    source: &str,
) -> Result<String> {
    match existing {
        Some(text) => {
            let merged = section::merge(text, &cfg.task_header, &cfg.terminators, body);
            Ok(refresh_footer(&merged, &clock.stamp(), source))
        }
        None => {
            let skeleton = load_skeleton(cfg.skeleton.as_deref())?;
            render_document(
                &skeleton,
                &DocumentVars {
                    date: clock.date_label(),
                    task_header: &cfg.task_header,
                    tasks: body,
                    terminator: cfg.section_end(),
                    updated_at: clock.stamp(),
                    source,
                },
            )
        }
    }
}

/// Compose and write the entry at `path`. Errors here abort the run.
pub fn update_entry(
    path: &Path,
    existing: Option<&str>,
    cfg: &JournalConfig,
    clock: &RunClock,
    body: &str,
    source: &str,
) -> Result<(String, EntryWrite)> {
    let text = compose_entry(existing, cfg, clock, body, source)?;
    write_entry(path, &text).with_context(|| format!("write journal entry {}", path.display()))?;
    let write = if existing.is_some() {
        EntryWrite::Updated
    } else {
        EntryWrite::Created
    };
    info!(path = %path.display(), write = write.as_str(), "journal entry written");
    Ok((text, write))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixed_clock;
    use std::fs;

    #[test]
    fn missing_entry_uses_skeleton() {
        let cfg = JournalConfig::default();
        let text = compose_entry(None, &cfg, &fixed_clock(), "- [ ] a", "Local Sync").expect("compose");
        assert!(text.contains("### 2024-05-01\n"));
        assert_eq!(
            section::extract(&text, &cfg.task_header, &cfg.terminators),
            Some("- [ ] a")
        );
    }

    #[test]
    fn existing_entry_keeps_other_sections() {
        let cfg = JournalConfig::default();
        let existing = "intro\n#### Today's Tasks\n- [ ] old\n#### AI Review\nreview\n";
        let text = compose_entry(Some(existing), &cfg, &fixed_clock(), "- [ ] new", "Local Sync")
            .expect("compose");
        assert_eq!(
            text,
            "intro\n#### Today's Tasks\n- [ ] new\n\n#### AI Review\nreview\n"
        );
    }

    #[test]
    fn custom_terminator_survives_a_second_merge() {
        let cfg = JournalConfig {
            task_header: "#### Tasks".to_string(),
            terminators: vec!["#### Reflection".to_string()],
            ..JournalConfig::default()
        };
        let created = compose_entry(None, &cfg, &fixed_clock(), "- [ ] a", "Local Sync").expect("create");
        let updated =
            compose_entry(Some(&created), &cfg, &fixed_clock(), "- [ ] b", "Local Sync").expect("update");
        assert_eq!(updated, created.replace("- [ ] a", "- [ ] b"));
    }

    #[test]
    fn existing_footer_gets_current_stamp() {
        let cfg = JournalConfig::default();
        let existing = "#### Today's Tasks\n- [ ] a\n\n#### AI Review\n\n---\n*Last updated: 2024-04-30 21:00:00 (Local Sync)*\n";
        let text = compose_entry(Some(existing), &cfg, &fixed_clock(), "- [ ] a", "Bidirectional Sync")
            .expect("compose");
        assert!(text.ends_with("*Last updated: 2024-05-01 08:00:00 (Bidirectional Sync)*\n"));
    }

    #[test]
    fn missing_custom_skeleton_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = JournalConfig {
            skeleton: Some(temp.path().join("missing.md")),
            ..JournalConfig::default()
        };
        assert!(compose_entry(None, &cfg, &fixed_clock(), "x", "Local Sync").is_err());
    }

    #[test]
    fn update_reports_created_then_updated() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = JournalConfig::default();
        let path = temp.path().join("2024/05/01.md");
        let (first, write) =
            update_entry(&path, None, &cfg, &fixed_clock(), "- [ ] a", "Local Sync").expect("create");
        assert_eq!(write, EntryWrite::Created);
        let (_, write) = update_entry(&path, Some(&first), &cfg, &fixed_clock(), "- [ ] b", "Local Sync")
            .expect("update");
        assert_eq!(write, EntryWrite::Updated);
        let on_disk = fs::read_to_string(&path).expect("read");
        assert!(on_disk.contains("#### Today's Tasks\n- [ ] b\n\n#### AI Review"));
    }
}
