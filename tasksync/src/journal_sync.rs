//! Orchestration for `tasksync sync`: two-way sync between the task service
//! and today's journal entry.
//!
//! Check marks in the journal are pushed first, then the task section is
//! re-rendered from a fresh snapshot, so tasks closed in this run show up in
//! the completed group.

use std::fmt;
use std::path::PathBuf;

use anyhow::Result;
use tracing::{info, warn};

use crate::clock::RunClock;
use crate::core::checklist::{AnnotationStripper, parse_checklist};
use crate::core::daily::{daily_file_path, daily_relay_path};
use crate::core::reconcile::plan_completions;
use crate::core::render::render_body;
use crate::core::section;
use crate::core::types::SyncStatus;
use crate::entry::{EntryWrite, update_entry};
use crate::io::config::SyncConfig;
use crate::io::journal::read_entry;
use crate::io::relay::{RelayStore, RelayWrite, mirror};
use crate::io::status::{StatusRecord, record_local};
use crate::io::todoist::TaskSource;
use crate::snapshot::{fetch_open_tasks, fetch_snapshot};

const SOURCE_LABEL: &str = "Bidirectional Sync";

/// Tasks closed remotely because the journal showed them checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushReport {
    pub closed: Vec<String>,
    pub failed: usize,
}

/// Result of a sync run.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub journal_path: PathBuf,
    pub tasks_count: usize,
    pub push: PushReport,
    pub write: EntryWrite,
    /// `Skipped` when mirroring is disabled or no relay is configured.
    pub mirror: RelayWrite,
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sync: {} tasks, {} closed",
            self.tasks_count,
            self.push.closed.len()
        )?;
        if self.push.failed > 0 {
            write!(f, " ({} failed)", self.push.failed)?;
        }
        write!(f, ", {} {}", self.journal_path.display(), self.write.as_str())?;
        match self.mirror {
            RelayWrite::Stored(_) => write!(f, ", mirrored"),
            RelayWrite::Failed => write!(f, ", mirror failed"),
            RelayWrite::Skipped => Ok(()),
        }
    }
}

/// Close remotely the open tasks checked in `entry`'s task section.
///
/// Close failures are logged and counted.
pub fn push_completions<S: TaskSource + ?Sized>(
    source: &S,
    entry: &str,
    cfg: &SyncConfig,
) -> Result<PushReport> {
    let Some(body) = section::extract(entry, &cfg.journal.task_header, &cfg.journal.terminators)
    else {
        return Ok(PushReport::default());
    };
    let lines = parse_checklist(body);
    if !lines.iter().any(|l| l.checked) {
        return Ok(PushReport::default());
    }

    let stripper = AnnotationStripper::new(&cfg.render)?;
    let open = fetch_open_tasks(source, &cfg.todoist.filters);
    let mut report = PushReport::default();
    for planned in plan_completions(&lines, &open, &stripper) {
        match source.close(&planned.task_id) {
            Ok(()) => {
                info!(task_id = %planned.task_id, content = %planned.content, "closed task");
                report.closed.push(planned.task_id);
            }
            Err(err) => {
                warn!(task_id = %planned.task_id, error = %format!("{err:#}"), "close failed");
                report.failed += 1;
            }
        }
    }
    Ok(report)
}

/// Run a two-way sync for today.
///
/// Reading or writing the journal entry is fatal and leaves a `failed`
/// status record; every remote failure degrades and the run continues.
pub fn run_sync<S, R>(
    source: &S,
    relay: Option<&R>,
    cfg: &SyncConfig,
    clock: &RunClock,
) -> Result<SyncOutcome>
where
    S: TaskSource + ?Sized,
    R: RelayStore + ?Sized,
{
    let result = sync_once(source, relay, cfg, clock);
    let (tasks_count, sync_status) = match &result {
        Ok(outcome) => (outcome.tasks_count, SyncStatus::Success),
        Err(_) => (0, SyncStatus::Failed),
    };
    record_local(
        &cfg.journal.status_path,
        &StatusRecord {
            last_sync: clock.now,
            tasks_count,
            sync_status,
        },
    );
    if let Ok(outcome) = &result {
        info!(%outcome, "sync run finished");
    }
    result
}

fn sync_once<S, R>(
    source: &S,
    relay: Option<&R>,
    cfg: &SyncConfig,
    clock: &RunClock,
) -> Result<SyncOutcome>
where
    S: TaskSource + ?Sized,
    R: RelayStore + ?Sized,
{
    let today = clock.today();
    let journal_path = daily_file_path(&cfg.journal.root, today, &cfg.journal.extension);
    let existing = read_entry(&journal_path)?;

    let push = match &existing {
        Some(entry) => push_completions(source, entry, cfg)?,
        None => PushReport::default(),
    };

    let snapshot = fetch_snapshot(source, &cfg.todoist, clock);
    let body = render_body(&snapshot, &clock.render_context(), &cfg.render);
    let (text, write) = update_entry(
        &journal_path,
        existing.as_deref(),
        &cfg.journal,
        clock,
        &body,
        SOURCE_LABEL,
    )?;

    let mirrored = match relay {
        Some(relay) if cfg.journal.mirror => {
            let path = daily_relay_path(&cfg.relay.notes_dir, today, &cfg.journal.extension);
            let subject = format!("daily note for {}", clock.date_label());
            RelayWrite::from_attempt(&path, mirror(relay, &path, &text, &subject))
        }
        _ => RelayWrite::Skipped,
    };

    Ok(SyncOutcome {
        journal_path,
        tasks_count: snapshot.len(),
        push,
        write,
        mirror: mirrored,
    })
}
