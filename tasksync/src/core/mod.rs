//! Deterministic, pure logic shared by the sync pipelines.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! text and task snapshots and return deterministic outputs suitable for tests.

pub mod checklist;
pub mod daily;
pub mod reconcile;
pub mod render;
pub mod section;
pub mod types;
