//! Task sync between a remote task service, a markdown journal, and a
//! hosted relay repository.
//!
//! The crate keeps a strict separation:
//!
//! - **[`core`]**: Pure logic (checklist rendering, section merge, daily paths,
//!   completion planning). No I/O.
//! - **[`io`]**: Side effects (config, HTTP clients, journal files, status record).
//!   Remote services sit behind traits so pipelines run against fakes in tests.
//!
//! Orchestration modules ([`cloud`], [`local`], [`journal_sync`]) wire core
//! logic to I/O to implement the CLI commands.

pub mod clock;
pub mod cloud;
pub mod core;
pub mod entry;
pub mod exit_codes;
pub mod io;
pub mod journal_sync;
pub mod local;
pub mod logging;
pub mod snapshot;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
