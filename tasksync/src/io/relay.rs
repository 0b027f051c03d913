//! Relay storage: a hosted contents API used to move documents between
//! machines that do not share a filesystem.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// A stored blob and the revision id needed to replace it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayFile {
    pub content: String,
    pub sha: String,
}

/// Abstraction over relay storage backends.
pub trait RelayStore {
    /// Current blob at `path`, or `None` if nothing is stored there.
    fn get(&self, path: &str) -> Result<Option<RelayFile>>;

    /// Create (`sha = None`) or replace (`sha = Some(prior)`) the blob at `path`.
    fn put(&self, path: &str, message: &str, content: &str, sha: Option<&str>) -> Result<()>;
}

/// Whether [`mirror`] created a new blob or replaced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorOutcome {
    Created,
    Updated,
}

/// What a run did with its relay document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayWrite {
    Stored(MirrorOutcome),
    /// No relay configured, or writing to it is turned off.
    Skipped,
    /// The relay call failed; the run continued.
    Failed,
}

impl RelayWrite {
    /// Fold a mirror attempt into a write state, logging any failure.
    pub fn from_attempt(path: &str, attempt: Result<MirrorOutcome>) -> Self {
        match attempt {
            Ok(outcome) => RelayWrite::Stored(outcome),
            Err(err) => {
                warn!(path, error = %format!("{err:#}"), "relay document write failed");
                RelayWrite::Failed
            }
        }
    }
}

/// Store `content` at `path`, passing back the prior revision when one exists.
///
/// Commit messages read `Create <subject>` / `Update <subject>`.
pub fn mirror<R: RelayStore + ?Sized>(
    relay: &R,
    path: &str,
    content: &str,
    subject: &str,
) -> Result<MirrorOutcome> {
    mirror_with(relay, path, subject, |_| content.to_string())
}

/// Like [`mirror`], but builds the stored text from the current blob (if any).
pub fn mirror_with<R, F>(relay: &R, path: &str, subject: &str, build: F) -> Result<MirrorOutcome>
where
    R: RelayStore + ?Sized,
    F: FnOnce(Option<&str>) -> String,
{
    let existing = relay
        .get(path)
        .with_context(|| format!("read relay {path}"))?;
    let outcome = match existing {
        Some(file) => {
            let content = build(Some(&file.content));
            relay
                .put(path, &format!("Update {subject}"), &content, Some(&file.sha))
                .with_context(|| format!("update relay {path}"))?;
            MirrorOutcome::Updated
        }
        None => {
            let content = build(None);
            relay
                .put(path, &format!("Create {subject}"), &content, None)
                .with_context(|| format!("create relay {path}"))?;
            MirrorOutcome::Created
        }
    };
    info!(path, ?outcome, "mirrored to relay");
    Ok(outcome)
}

/// [`RelayStore`] backed by the GitHub contents API.
pub struct GitHubRelay {
    api_url: String,
    repository: String,
    token: Option<String>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: String,
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutBody<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

impl GitHubRelay {
    pub fn new(
        api_url: &str,
        repository: &str,
        token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tasksync/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build relay http client")?;
        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            repository: repository.trim_matches('/').to_string(),
            token: token.map(str::to_string),
            client,
        })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.api_url,
            self.repository,
            path.trim_start_matches('/')
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(ACCEPT, "application/vnd.github.v3+json");
        match &self.token {
            Some(token) => request.header("Authorization", format!("token {token}")),
            None => request,
        }
    }
}

impl RelayStore for GitHubRelay {
    #[instrument(skip(self))]
    fn get(&self, path: &str) -> Result<Option<RelayFile>> {
        let resp = self
            .authorize(self.client.get(self.contents_url(path)))
            .send()
            .context("GET contents")?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            debug!("relay blob absent");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(anyhow!("GET contents returned HTTP {status}"));
        }
        let body: ContentsResponse = resp.json().context("parse contents response")?;
        let content = decode_content(&body.content)?;
        Ok(Some(RelayFile {
            content,
            sha: body.sha,
        }))
    }

    #[instrument(skip(self, content))]
    fn put(&self, path: &str, message: &str, content: &str, sha: Option<&str>) -> Result<()> {
        if self.token.is_none() {
            return Err(anyhow!("relay writes need a GITHUB_TOKEN"));
        }
        let body = PutBody {
            message,
            content: BASE64.encode(content.as_bytes()),
            sha,
        };
        let resp = self
            .authorize(self.client.put(self.contents_url(path)))
            .json(&body)
            .send()
            .context("PUT contents")?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().unwrap_or_default();
            return Err(anyhow!("PUT contents returned HTTP {status}: {detail}"));
        }
        Ok(())
    }
}

/// Decode a contents-API payload; the service wraps base64 at 60 columns.
fn decode_content(encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64.decode(compact).context("decode relay base64")?;
    String::from_utf8(bytes).context("relay content is not utf-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryRelay;

    #[test]
    fn decodes_wrapped_base64() {
        let encoded = BASE64.encode("# 2024-05-01\n\n## Today's Tasks\n- [ ] 牛乳を買う\n");
        let wrapped = format!("{}\n{}\n", &encoded[..20], &encoded[20..]);
        assert_eq!(
            decode_content(&wrapped).expect("decode"),
            "# 2024-05-01\n\n## Today's Tasks\n- [ ] 牛乳を買う\n"
        );
    }

    #[test]
    fn put_body_omits_sha_on_create() {
        let body = PutBody {
            message: "Create sync data",
            content: BASE64.encode("{}"),
            sha: None,
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert!(json.get("sha").is_none());
        assert_eq!(json["content"], "e30=");
    }

    #[test]
    fn contents_url_joins_repository_and_path() {
        let relay = GitHubRelay::new(
            "https://api.github.com/",
            "me/notes",
            None,
            Duration::from_secs(5),
        )
        .expect("relay");
        assert_eq!(
            relay.contents_url("/daily_notes/2024/05/01.md"),
            "https://api.github.com/repos/me/notes/contents/daily_notes/2024/05/01.md"
        );
    }

    #[test]
    fn mirror_creates_then_updates_with_prior_sha() {
        let relay = MemoryRelay::default();

        let first = mirror(&relay, "notes/a.md", "one", "daily note").expect("create");
        assert_eq!(first, MirrorOutcome::Created);
        let sha = relay.sha("notes/a.md").expect("sha");

        let second = mirror(&relay, "notes/a.md", "two", "daily note").expect("update");
        assert_eq!(second, MirrorOutcome::Updated);
        assert_eq!(relay.content("notes/a.md").as_deref(), Some("two"));

        let puts = relay.puts();
        assert_eq!(puts.len(), 2);
        assert_eq!(puts[0].message, "Create daily note");
        assert_eq!(puts[0].sha, None);
        assert_eq!(puts[1].message, "Update daily note");
        assert_eq!(puts[1].sha, Some(sha));
    }

    #[test]
    fn failed_attempt_folds_into_failed_write() {
        let relay = MemoryRelay::failing();
        let attempt = mirror(&relay, "notes/a.md", "one", "daily note");
        assert_eq!(RelayWrite::from_attempt("notes/a.md", attempt), RelayWrite::Failed);
        assert_eq!(
            RelayWrite::from_attempt("notes/a.md", Ok(MirrorOutcome::Updated)),
            RelayWrite::Stored(MirrorOutcome::Updated)
        );
    }

    #[test]
    fn mirror_surfaces_relay_failures() {
        let relay = MemoryRelay::failing();
        let err = mirror(&relay, "notes/a.md", "one", "daily note").unwrap_err();
        assert!(format!("{err:#}").contains("read relay notes/a.md"));
    }
}
