//! Sync status record (`sync_data.json`).
//!
//! The record is overwritten on every run and never read back by the sync
//! logic; it exists for humans and schedulers.

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::types::SyncStatus;
use crate::io::journal::write_atomic;
use crate::io::relay::{RelayStore, mirror};

/// Last-run summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusRecord {
    pub last_sync: DateTime<FixedOffset>,
    pub tasks_count: usize,
    pub sync_status: SyncStatus,
}

impl StatusRecord {
    /// Two-space-indented JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let mut buf = serde_json::to_string_pretty(self)?;
        buf.push('\n');
        Ok(buf)
    }
}

/// Overwrite the local status record.
pub fn write_status(path: &Path, record: &StatusRecord) -> Result<()> {
    debug!(path = %path.display(), count = record.tasks_count, status = record.sync_status.as_str(), "writing status record");
    write_atomic(path, &record.to_json()?)
}

/// Write the local status record, logging instead of failing.
pub fn record_local(path: &Path, record: &StatusRecord) {
    if let Err(err) = write_status(path, record) {
        warn!(path = %path.display(), error = %format!("{err:#}"), "status record write failed");
    }
}

/// Overwrite the status record stored on the relay.
pub fn put_status<R: RelayStore + ?Sized>(relay: &R, path: &str, record: &StatusRecord) -> Result<()> {
    debug!(path, count = record.tasks_count, "putting status record");
    mirror(relay, path, &record.to_json()?, "sync data")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryRelay;
    use std::fs;

    fn record() -> StatusRecord {
        StatusRecord {
            last_sync: DateTime::parse_from_rfc3339("2024-05-01T08:00:00+09:00").expect("ts"),
            tasks_count: 3,
            sync_status: SyncStatus::Success,
        }
    }

    /// Ensures the record serializes to a known, stable JSON format.
    #[test]
    fn status_record_format_is_stable() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("sync_data.json");
        write_status(&path, &record()).expect("write");
        let contents = fs::read_to_string(&path).expect("read");
        let expected = "{\n  \"last_sync\": \"2024-05-01T08:00:00+09:00\",\n  \"tasks_count\": 3,\n  \"sync_status\": \"success\"\n}\n";
        assert_eq!(contents, expected);
    }

    #[test]
    fn rewrite_overwrites_previous_record() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("sync_data.json");
        write_status(&path, &record()).expect("write");
        let failed = StatusRecord {
            tasks_count: 0,
            sync_status: SyncStatus::Failed,
            ..record()
        };
        write_status(&path, &failed).expect("rewrite");
        let loaded: StatusRecord =
            serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("parse");
        assert_eq!(loaded, failed);
    }

    #[test]
    fn record_local_swallows_write_errors() {
        let temp = tempfile::tempdir().expect("tempdir");
        // A directory in the way makes the rename fail.
        let path = temp.path().join("sync_data.json");
        fs::create_dir_all(path.join("child")).expect("mkdir");
        record_local(&path, &record());
        assert!(path.is_dir());
    }

    #[test]
    fn relay_status_uses_sync_data_messages() {
        let relay = MemoryRelay::default();
        put_status(&relay, "sync_data.json", &record()).expect("put");
        put_status(&relay, "sync_data.json", &record()).expect("put again");
        let messages: Vec<String> = relay.puts().into_iter().map(|p| p.message).collect();
        assert_eq!(messages, vec!["Create sync data", "Update sync data"]);
    }
}
