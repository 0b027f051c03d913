//! Stable exit codes for tasksync commands.

/// Command finished, including runs that degraded after a remote failure.
pub const OK: i32 = 0;
/// Missing credential or unusable configuration; nothing was touched.
pub const CONFIG: i32 = 1;
