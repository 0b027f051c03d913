//! `tasksync` command-line entry point.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::error;

use tasksync::clock::RunClock;
use tasksync::cloud::run_cloud;
use tasksync::core::daily::daily_file_path;
use tasksync::exit_codes;
use tasksync::io::config::{ConfigError, Credentials, SyncConfig, load_config};
use tasksync::io::relay::GitHubRelay;
use tasksync::io::todoist::TodoistClient;
use tasksync::journal_sync::run_sync;
use tasksync::local::run_local;
use tasksync::logging;

#[derive(Parser)]
#[command(
    name = "tasksync",
    version,
    about = "Sync today's tasks between Todoist, a markdown journal, and a GitHub relay"
)]
struct Cli {
    /// Config file; defaults apply when it does not exist.
    #[arg(long, global = true, default_value = "tasksync.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render today's tasks into the relay document (for machines without the journal).
    Cloud,
    /// Copy the task section of today's relay document into the journal.
    Local,
    /// Push journal check marks to Todoist, then refresh the journal task section.
    Sync,
    /// Print the journal path for a date.
    Path {
        /// Date as YYYY-MM-DD; defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(summary) => {
            println!("{summary}");
            exit_codes::OK
        }
        Err(err) if err.downcast_ref::<ConfigError>().is_some() => {
            error!("{err:#}");
            exit_codes::CONFIG
        }
        Err(err) => {
            error!("{err:#}");
            exit_codes::OK
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<String> {
    let cfg = load_config(&cli.config)?;
    let creds = Credentials::from_env();
    let clock = RunClock::now();

    match cli.command {
        Command::Path { date } => {
            let date = date.unwrap_or_else(|| clock.today());
            let path = daily_file_path(&cfg.journal.root, date, &cfg.journal.extension);
            Ok(path.display().to_string())
        }
        Command::Cloud => {
            let token = creds.require_todoist()?;
            // Without a token the relay document could be read but never stored.
            let relay = if creds.github_token.is_some() {
                build_relay(&cfg, &creds)?
            } else {
                None
            };
            let source = TodoistClient::new(&cfg.todoist, token, timeout(&cfg))?;
            Ok(run_cloud(&source, relay.as_ref(), &cfg, &clock)?.to_string())
        }
        Command::Local => {
            let relay = build_relay(&cfg, &creds)?.ok_or(ConfigError::MissingRepository)?;
            Ok(run_local(&relay, &cfg, &clock)?.to_string())
        }
        Command::Sync => {
            let token = creds.require_todoist()?;
            let relay = if cfg.journal.mirror && creds.github_token.is_some() {
                build_relay(&cfg, &creds)?
            } else {
                None
            };
            let source = TodoistClient::new(&cfg.todoist, token, timeout(&cfg))?;
            Ok(run_sync(&source, relay.as_ref(), &cfg, &clock)?.to_string())
        }
    }
}

fn build_relay(cfg: &SyncConfig, creds: &Credentials) -> Result<Option<GitHubRelay>> {
    let Some(repository) = creds.repository(&cfg.relay) else {
        return Ok(None);
    };
    let relay = GitHubRelay::new(
        &cfg.relay.api_url,
        repository,
        creds.github_token.as_deref(),
        timeout(cfg),
    )?;
    Ok(Some(relay))
}

fn timeout(cfg: &SyncConfig) -> Duration {
    Duration::from_secs(cfg.http_timeout_secs)
}
