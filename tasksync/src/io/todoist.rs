//! Task service abstraction and its Todoist implementation.
//!
//! The [`TaskSource`] trait decouples the sync pipelines from the HTTP API.
//! Tests use scripted sources that return predetermined snapshots without
//! touching the network.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDateTime;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::core::types::{CompletedItem, Task};
use crate::io::config::TodoistConfig;

/// Time range for the completed-tasks query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedWindow {
    pub since: NaiveDateTime,
    pub until: NaiveDateTime,
    pub limit: u32,
}

/// Abstraction over the remote task service.
pub trait TaskSource {
    /// Open tasks matching `filter`, in service order. Non-success responses are errors.
    fn tasks(&self, filter: &str) -> Result<Vec<Task>>;

    /// Tasks completed inside `window`.
    fn completed(&self, window: &CompletedWindow) -> Result<Vec<CompletedItem>>;

    /// Close an open task.
    fn close(&self, task_id: &str) -> Result<()>;
}

/// [`TaskSource`] backed by the Todoist REST and Sync APIs.
pub struct TodoistClient {
    rest_url: String,
    sync_url: String,
    token: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct CompletedResponse {
    #[serde(default)]
    items: Vec<CompletedItem>,
}

const QUERY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

impl TodoistClient {
    pub fn new(cfg: &TodoistConfig, token: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tasksync/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build todoist http client")?;
        Ok(Self {
            rest_url: cfg.rest_url.trim_end_matches('/').to_string(),
            sync_url: cfg.sync_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client,
        })
    }
}

impl TaskSource for TodoistClient {
    #[instrument(skip(self))]
    fn tasks(&self, filter: &str) -> Result<Vec<Task>> {
        let resp = self
            .client
            .get(format!("{}/tasks", self.rest_url))
            .bearer_auth(&self.token)
            .query(&[("filter", filter)])
            .send()
            .context("GET tasks")?;
        let tasks: Vec<Task> = read_json(resp, "GET tasks")?;
        debug!(count = tasks.len(), "fetched tasks");
        Ok(tasks)
    }

    #[instrument(skip_all, fields(since = %window.since, until = %window.until))]
    fn completed(&self, window: &CompletedWindow) -> Result<Vec<CompletedItem>> {
        let since = window.since.format(QUERY_TIME_FORMAT).to_string();
        let until = window.until.format(QUERY_TIME_FORMAT).to_string();
        let limit = window.limit.to_string();
        let resp = self
            .client
            .get(format!("{}/completed/get_all", self.sync_url))
            .bearer_auth(&self.token)
            .query(&[
                ("since", since.as_str()),
                ("until", until.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .context("GET completed")?;
        let body: CompletedResponse = read_json(resp, "GET completed")?;
        debug!(count = body.items.len(), "fetched completed items");
        Ok(body.items)
    }

    #[instrument(skip(self))]
    fn close(&self, task_id: &str) -> Result<()> {
        let resp = self
            .client
            .post(format!("{}/tasks/{}/close", self.rest_url, task_id))
            .bearer_auth(&self.token)
            .send()
            .context("POST close")?;
        // The service answers a successful close with an empty 204.
        if resp.status() != StatusCode::NO_CONTENT {
            return Err(anyhow!("POST close returned HTTP {}", resp.status()));
        }
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        return Err(anyhow!("{what} returned HTTP {status}"));
    }
    resp.json::<T>()
        .with_context(|| format!("parse {what} response"))
}
