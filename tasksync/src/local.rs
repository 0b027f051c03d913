//! Orchestration for `tasksync local`: relay document to the journal.

use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::clock::RunClock;
use crate::core::checklist::parse_checklist;
use crate::core::daily::{daily_file_path, daily_relay_path};
use crate::core::section;
use crate::core::types::SyncStatus;
use crate::entry::{EntryWrite, update_entry};
use crate::io::config::SyncConfig;
use crate::io::journal::read_entry;
use crate::io::relay::RelayStore;
use crate::io::status::{StatusRecord, record_local};

const SOURCE_LABEL: &str = "Local Sync";

/// Why a local run left the journal alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullSkip {
    /// No document for today on the relay (or the relay was unreachable).
    MissingDocument,
    /// The document has no task section, or the section is empty.
    MissingSection,
}

/// Result of a local run.
#[derive(Debug, Clone)]
pub struct LocalOutcome {
    pub journal_path: PathBuf,
    pub tasks_count: usize,
    pub write: Result<EntryWrite, PullSkip>,
}

impl fmt::Display for LocalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.journal_path.display();
        match self.write {
            Ok(write) => write!(f, "local: {} tasks, {} {}", self.tasks_count, path, write.as_str()),
            Err(PullSkip::MissingDocument) => write!(f, "local: no relay document for today, {path} unchanged"),
            Err(PullSkip::MissingSection) => write!(f, "local: relay document has no tasks, {path} unchanged"),
        }
    }
}

/// Section body to copy into the journal.
///
/// Checklist lines are kept (with wrapped continuations joined); a section
/// without any, such as the placeholder, is kept verbatim.
pub fn pulled_body(relay_body: &str) -> (String, usize) {
    let lines = parse_checklist(relay_body);
    if lines.is_empty() {
        return (relay_body.trim().to_string(), 0);
    }
    let body = lines
        .iter()
        .map(|l| l.render())
        .collect::<Vec<_>>()
        .join("\n");
    (body, lines.len())
}

/// Copy the task section of today's relay document into today's journal entry.
///
/// A missing document or section leaves the journal untouched. Failing to
/// read or write the journal aborts the run with a `failed` status record.
pub fn run_local<R: RelayStore + ?Sized>(
    relay: &R,
    cfg: &SyncConfig,
    clock: &RunClock,
) -> Result<LocalOutcome> {
    let today = clock.today();
    let journal_path = daily_file_path(&cfg.journal.root, today, &cfg.journal.extension);
    let relay_path = daily_relay_path(&cfg.relay.notes_dir, today, &cfg.journal.extension);

    let document = relay.get(&relay_path).unwrap_or_else(|err| {
        warn!(path = %relay_path, error = %format!("{err:#}"), "relay read failed");
        None
    });
    let pulled = match &document {
        None => {
            warn!(path = %relay_path, "relay document not found");
            Err(PullSkip::MissingDocument)
        }
        Some(file) => {
            match section::extract(&file.content, &cfg.relay.task_header, &cfg.relay.terminators)
                .filter(|body| !body.trim().is_empty())
            {
                Some(body) => Ok(pulled_body(body)),
                None => {
                    warn!(path = %relay_path, header = %cfg.relay.task_header, "relay task section not found");
                    Err(PullSkip::MissingSection)
                }
            }
        }
    };

    let (body, tasks_count) = match pulled {
        Ok(pulled) => pulled,
        Err(skip) => {
            record_local(&cfg.journal.status_path, &status(clock, 0, SyncStatus::Success));
            let outcome = LocalOutcome {
                journal_path,
                tasks_count: 0,
                write: Err(skip),
            };
            info!(%outcome, "local run finished");
            return Ok(outcome);
        }
    };

    let attempt = || -> Result<EntryWrite> {
        let existing = read_entry(&journal_path)?;
        let (_, write) = update_entry(
            &journal_path,
            existing.as_deref(),
            &cfg.journal,
            clock,
            &body,
            SOURCE_LABEL,
        )?;
        Ok(write)
    };
    let write = match attempt() {
        Ok(write) => write,
        Err(err) => {
            record_local(&cfg.journal.status_path, &status(clock, tasks_count, SyncStatus::Failed));
            return Err(err).context("update journal from relay");
        }
    };

    record_local(&cfg.journal.status_path, &status(clock, tasks_count, SyncStatus::Success));
    let outcome = LocalOutcome {
        journal_path,
        tasks_count,
        write: Ok(write),
    };
    info!(%outcome, "local run finished");
    Ok(outcome)
}

fn status(clock: &RunClock, tasks_count: usize, sync_status: SyncStatus) -> StatusRecord {
    StatusRecord {
        last_sync: clock.now,
        tasks_count,
        sync_status,
    }
}
