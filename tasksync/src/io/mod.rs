//! I/O helpers for the sync commands.

pub mod config;
pub mod journal;
pub mod relay;
pub mod status;
pub mod template;
pub mod todoist;
