//! Orchestration for `tasksync cloud`: tasks to the relay document.

use std::fmt;

use anyhow::Result;
use tracing::{info, warn};

use crate::clock::RunClock;
use crate::core::daily::daily_relay_path;
use crate::core::render::render_body;
use crate::core::section;
use crate::core::types::SyncStatus;
use crate::io::config::SyncConfig;
use crate::io::relay::{MirrorOutcome, RelayStore, RelayWrite, mirror_with};
use crate::io::status::{StatusRecord, put_status, write_status};
use crate::io::template::{DocumentVars, RELAY_DOCUMENT, refresh_footer, render_document};
use crate::io::todoist::TaskSource;
use crate::snapshot::fetch_snapshot;

const SOURCE_LABEL: &str = "GitHub Actions";

/// Result of a cloud run.
#[derive(Debug, Clone)]
pub struct CloudOutcome {
    pub relay_path: String,
    pub tasks_count: usize,
    pub relay: RelayWrite,
}

impl fmt::Display for CloudOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.relay {
            RelayWrite::Stored(MirrorOutcome::Created) => "created",
            RelayWrite::Stored(MirrorOutcome::Updated) => "updated",
            RelayWrite::Skipped => "skipped (no relay)",
            RelayWrite::Failed => "failed",
        };
        write!(f, "cloud: {} tasks, {} {}", self.tasks_count, self.relay_path, state)
    }
}

/// Fetch today's tasks and store them in the relay document for today.
///
/// An existing relay document keeps everything outside its task section
/// apart from a refreshed footer; otherwise a fresh document is rendered. Relay and status failures are
/// logged, never returned.
pub fn run_cloud<S, R>(
    source: &S,
    relay: Option<&R>,
    cfg: &SyncConfig,
    clock: &RunClock,
) -> Result<CloudOutcome>
where
    S: TaskSource + ?Sized,
    R: RelayStore + ?Sized,
{
    let snapshot = fetch_snapshot(source, &cfg.todoist, clock);
    let body = render_body(&snapshot, &clock.render_context(), &cfg.render);
    let relay_path = daily_relay_path(&cfg.relay.notes_dir, clock.today(), &cfg.journal.extension);
    let stamp = clock.stamp();

    let fresh = render_document(
        RELAY_DOCUMENT,
        &DocumentVars {
            date: clock.date_label(),
            task_header: &cfg.relay.task_header,
            tasks: &body,
            terminator: cfg.relay.section_end(),
            updated_at: stamp.clone(),
            source: SOURCE_LABEL,
        },
    )?;

    let write = match relay {
        Some(relay) => {
            let subject = format!("daily note for {}", clock.date_label());
            let stored = mirror_with(relay, &relay_path, &subject, |existing| match existing {
                Some(doc) => {
                    let merged =
                        section::merge(doc, &cfg.relay.task_header, &cfg.relay.terminators, &body);
                    refresh_footer(&merged, &stamp, SOURCE_LABEL)
                }
                None => fresh,
            });
            RelayWrite::from_attempt(&relay_path, stored)
        }
        None => {
            warn!("relay repository not configured; document not stored");
            RelayWrite::Skipped
        }
    };

    let record = StatusRecord {
        last_sync: clock.now,
        tasks_count: snapshot.len(),
        sync_status: SyncStatus::Success,
    };
    let status = match relay {
        Some(relay) => put_status(relay, &cfg.relay.status_file, &record),
        None => write_status(&cfg.journal.status_path, &record),
    };
    if let Err(err) = status {
        warn!(error = %format!("{err:#}"), "status record write failed");
    }

    let outcome = CloudOutcome {
        relay_path,
        tasks_count: snapshot.len(),
        relay: write,
    };
    info!(%outcome, "cloud run finished");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryRelay, ScriptedTaskSource, config_in, fixed_clock, task_due};

    const PATH: &str = "daily_notes/2024/05/01.md";

    fn source() -> ScriptedTaskSource {
        ScriptedTaskSource::new()
            .with_tasks("today", vec![task_due("1", "Buy milk", "2024-05-01")])
    }

    #[test]
    fn creates_relay_document_and_status() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = config_in(temp.path());
        let relay = MemoryRelay::default();

        let outcome = run_cloud(&source(), Some(&relay), &cfg, &fixed_clock()).expect("run");
        assert_eq!(outcome.relay, RelayWrite::Stored(MirrorOutcome::Created));
        assert_eq!(outcome.tasks_count, 1);

        let doc = relay.content(PATH).expect("document");
        assert!(doc.starts_with("# 2024-05-01\n\n## Today's Tasks\n"));
        assert_eq!(
            section::extract(&doc, "## Today's Tasks", &cfg.relay.terminators),
            Some("\n- [ ] Buy milk 🔥")
        );
        let status = relay.content("sync_data.json").expect("status");
        assert!(status.contains("\"tasks_count\": 1"));
        assert_eq!(relay.puts()[0].message, "Create daily note for 2024-05-01");
        assert!(!cfg.journal.status_path.exists());
    }

    #[test]
    fn existing_document_keeps_notes() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = config_in(temp.path());
        let relay = MemoryRelay::default().with_file(
            PATH,
            "# 2024-05-01\n\n## Today's Tasks\n- [ ] old\n\n## Notes\nkeep me\n",
        );
        let sha = relay.sha(PATH);

        let outcome = run_cloud(&source(), Some(&relay), &cfg, &fixed_clock()).expect("run");
        assert_eq!(outcome.relay, RelayWrite::Stored(MirrorOutcome::Updated));
        assert_eq!(
            relay.content(PATH).as_deref(),
            Some("# 2024-05-01\n\n## Today's Tasks\n- [ ] Buy milk 🔥\n\n## Notes\nkeep me\n")
        );
        assert_eq!(relay.puts()[0].sha, sha);
    }

    #[test]
    fn later_runs_refresh_the_footer() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = config_in(temp.path());
        let relay = MemoryRelay::default().with_file(
            PATH,
            "# 2024-05-01\n\n## Today's Tasks\n\nNo tasks\n\n## Notes\n\n---\n*Last updated: 2024-05-01 06:00:00 (GitHub Actions)*\n",
        );

        run_cloud(&source(), Some(&relay), &cfg, &fixed_clock()).expect("run");
        let doc = relay.content(PATH).expect("document");
        assert!(doc.ends_with("*Last updated: 2024-05-01 08:00:00 (GitHub Actions)*\n"));
        assert!(!doc.contains("06:00:00"));
    }

    #[test]
    fn custom_relay_terminator_closes_fresh_document() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut cfg = config_in(temp.path());
        cfg.relay.terminators = vec!["## Journal".to_string()];
        let relay = MemoryRelay::default();

        run_cloud(&source(), Some(&relay), &cfg, &fixed_clock()).expect("first");
        run_cloud(&source(), Some(&relay), &cfg, &fixed_clock()).expect("second");
        let doc = relay.content(PATH).expect("document");
        assert!(doc.contains("- [ ] Buy milk 🔥\n\n## Journal\n\n---\n*Last updated:"));
    }

    #[test]
    fn without_relay_status_is_written_locally() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = config_in(temp.path());
        let outcome =
            run_cloud::<_, MemoryRelay>(&source(), None, &cfg, &fixed_clock()).expect("run");
        assert_eq!(outcome.relay, RelayWrite::Skipped);
        let status = std::fs::read_to_string(&cfg.journal.status_path).expect("status");
        assert!(status.contains("\"sync_status\": \"success\""));
    }

    #[test]
    fn relay_failure_is_not_fatal() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = config_in(temp.path());
        let relay = MemoryRelay::failing();
        let outcome = run_cloud(&source(), Some(&relay), &cfg, &fixed_clock()).expect("run");
        assert_eq!(outcome.relay, RelayWrite::Failed);
        assert!(outcome.to_string().ends_with("failed"));
    }

    #[test]
    fn fetch_failure_stores_placeholder() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = config_in(temp.path());
        let relay = MemoryRelay::default();
        let source = ScriptedTaskSource::new().failing_tasks(500).failing_completed(500);

        let outcome = run_cloud(&source, Some(&relay), &cfg, &fixed_clock()).expect("run");
        assert_eq!(outcome.tasks_count, 0);
        let doc = relay.content(PATH).expect("document");
        assert!(doc.contains("## Today's Tasks\n\nNo tasks\n\n## Notes"));
    }
}
