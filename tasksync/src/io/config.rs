//! Sync configuration (`tasksync.toml`) and environment credentials.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::render::RenderLabels;

pub const TODOIST_TOKEN_VAR: &str = "TODOIST_API_TOKEN";
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";
pub const GITHUB_REPOSITORY_VAR: &str = "GITHUB_REPOSITORY";

/// Sync configuration (TOML).
///
/// Every table is optional; missing fields fall back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    /// Timeout applied to every HTTP request.
    pub http_timeout_secs: u64,
    pub journal: JournalConfig,
    pub todoist: TodoistConfig,
    pub relay: RelayConfig,
    pub render: RenderLabels,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JournalConfig {
    /// Root of the date-partitioned daily entries.
    pub root: PathBuf,
    pub extension: String,
    /// Header literal of the task section.
    pub task_header: String,
    /// Line prefixes that end the task section.
    pub terminators: Vec<String>,
    /// Optional minijinja template used to create a missing entry.
    pub skeleton: Option<PathBuf>,
    /// Local status record location.
    pub status_path: PathBuf,
    /// Mirror the written entry to the relay after `sync`.
    pub mirror: bool,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("journal"),
            extension: "md".to_string(),
            task_header: "#### Today's Tasks".to_string(),
            terminators: vec!["#### AI Review".to_string()],
            skeleton: None,
            status_path: PathBuf::from("sync_data.json"),
            mirror: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TodoistConfig {
    pub rest_url: String,
    pub sync_url: String,
    /// Filters fetched in order; later duplicates are dropped by id.
    pub filters: Vec<String>,
    /// Also list tasks completed since the start of today.
    pub include_completed: bool,
    pub completed_limit: u32,
}

impl Default for TodoistConfig {
    fn default() -> Self {
        Self {
            rest_url: "https://api.todoist.com/rest/v2".to_string(),
            sync_url: "https://api.todoist.com/sync/v9".to_string(),
            filters: vec!["today".to_string()],
            include_completed: true,
            completed_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RelayConfig {
    pub api_url: String,
    /// `owner/name`; `GITHUB_REPOSITORY` takes precedence.
    pub repository: Option<String>,
    /// Directory holding the relay copies of daily entries.
    pub notes_dir: String,
    /// Relay path of the status record written by `cloud`.
    pub status_file: String,
    /// Header literal of the task section in relay documents.
    pub task_header: String,
    pub terminators: Vec<String>,
}

impl JournalConfig {
    /// Terminator written below the task section of a new entry.
    pub fn section_end(&self) -> &str {
        first_terminator(&self.terminators)
    }
}

impl RelayConfig {
    /// Terminator written below the task section of a new relay document.
    pub fn section_end(&self) -> &str {
        first_terminator(&self.terminators)
    }
}

fn first_terminator(terminators: &[String]) -> &str {
    terminators.first().map_or("", String::as_str)
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            repository: None,
            notes_dir: "daily_notes".to_string(),
            status_file: "sync_data.json".to_string(),
            task_header: "## Today's Tasks".to_string(),
            terminators: vec!["## Notes".to_string()],
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: 30,
            journal: JournalConfig::default(),
            todoist: TodoistConfig::default(),
            relay: RelayConfig::default(),
            render: RenderLabels::default(),
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::Invalid("http_timeout_secs must be > 0"));
        }
        if self.journal.task_header.trim().is_empty() {
            return Err(ConfigError::Invalid("journal.task_header must not be empty"));
        }
        if self.relay.task_header.trim().is_empty() {
            return Err(ConfigError::Invalid("relay.task_header must not be empty"));
        }
        if !has_terminators(&self.journal.terminators) {
            return Err(ConfigError::Invalid(
                "journal.terminators must list at least one non-empty header",
            ));
        }
        if !has_terminators(&self.relay.terminators) {
            return Err(ConfigError::Invalid(
                "relay.terminators must list at least one non-empty header",
            ));
        }
        if self.todoist.filters.iter().any(|f| f.trim().is_empty()) {
            return Err(ConfigError::Invalid("todoist.filters must not contain empty entries"));
        }
        if self.todoist.completed_limit == 0 {
            return Err(ConfigError::Invalid("todoist.completed_limit must be > 0"));
        }
        if self.render.placeholder.trim().is_empty() {
            return Err(ConfigError::Invalid("render.placeholder must not be empty"));
        }
        Ok(())
    }
}

fn has_terminators(terminators: &[String]) -> bool {
    !terminators.is_empty() && terminators.iter().all(|t| !t.trim().is_empty())
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `SyncConfig::default()`.
pub fn load_config(path: &Path) -> Result<SyncConfig, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "config missing, using defaults");
        let cfg = SyncConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: SyncConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    cfg.validate()?;
    Ok(cfg)
}

/// Tokens and repository read from the environment.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub todoist_token: Option<String>,
    pub github_token: Option<String>,
    pub repository: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("todoist_token", &self.todoist_token.as_ref().map(|_| "<redacted>"))
            .field("github_token", &self.github_token.as_ref().map(|_| "<redacted>"))
            .field("repository", &self.repository)
            .finish()
    }
}

impl Credentials {
    /// Read credentials from the process environment. Empty values count as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            todoist_token: read(TODOIST_TOKEN_VAR),
            github_token: read(GITHUB_TOKEN_VAR),
            repository: read(GITHUB_REPOSITORY_VAR),
        }
    }

    pub fn require_todoist(&self) -> Result<&str, ConfigError> {
        self.todoist_token
            .as_deref()
            .ok_or(ConfigError::MissingCredential(TODOIST_TOKEN_VAR))
    }

    /// Repository from the environment, else from config.
    pub fn repository<'a>(&'a self, relay: &'a RelayConfig) -> Option<&'a str> {
        self.repository
            .as_deref()
            .or(relay.repository.as_deref())
            .filter(|r| !r.trim().is_empty())
    }
}

/// Fatal configuration problems; the only errors that end a run with a
/// non-zero exit code.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingCredential(&'static str),

    #[error("relay repository is not configured (set GITHUB_REPOSITORY or relay.repository)")]
    MissingRepository,

    #[error("read config {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(&'static str),
}
