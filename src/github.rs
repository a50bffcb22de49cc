use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, RETRY_AFTER, USER_AGENT};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use crate::cache::{ContentKey, ContentKind, ResponseCache};
use crate::error::{Error, Result};
use crate::metrics::{REQUEST_LATENCY, REQUEST_TOTAL};
use crate::models::{ContentEntry, Contents, EntryKind};
use crate::rate_limit::RequestGovernor;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

// Fallback when a 429 carries no reset information
const DEFAULT_RESET: Duration = Duration::from_secs(60);
const MIN_RESET: Duration = Duration::from_secs(1);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
    pub branch: String,
}

impl Repository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            branch: "main".to_string(),
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn contents_url(&self, api_url: &str, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            api_url.trim_end_matches('/'),
            self.owner,
            self.name,
            path.trim_matches('/'),
            self.branch
        )
    }

    fn key(&self, path: &str, kind: ContentKind) -> ContentKey {
        ContentKey {
            owner: self.owner.clone(),
            repo: self.name.clone(),
            reference: self.branch.clone(),
            path: path.trim_matches('/').to_string(),
            kind,
        }
    }
}

/// GitHub contents API client.
///
/// Every request goes through the shared [`RequestGovernor`]; every body is
/// memoized in the [`ResponseCache`].
pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
    governor: Arc<RequestGovernor>,
    cache: Arc<ResponseCache>,
}

impl GithubClient {
    pub fn new(
        http: reqwest::Client,
        api_url: impl Into<String>,
        token: Option<String>,
        governor: Arc<RequestGovernor>,
        cache: Arc<ResponseCache>,
    ) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            token: token.filter(|t| !t.is_empty()),
            governor,
            cache,
        }
    }

    pub fn governor(&self) -> &RequestGovernor {
        &self.governor
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    // Names of the sub directories under `path`
    pub async fn folder_names(&self, repo: &Repository, path: &str) -> Result<Vec<String>> {
        let entries = self.listing(repo, path).await?;
        Ok(entries
            .into_iter()
            .filter(|e| e.kind == EntryKind::Dir)
            .map(|e| e.name)
            .collect())
    }

    // File name -> size in bytes for the files directly under `path`
    pub async fn file_sizes(&self, repo: &Repository, path: &str) -> Result<HashMap<String, u64>> {
        let entries = self.listing(repo, path).await?;
        Ok(entries
            .into_iter()
            .filter(|e| e.kind == EntryKind::File)
            .map(|e| (e.name, e.size))
            .collect())
    }

    /// Fetch a single file through its download url and parse it as JSON.
    pub async fn file_json<T: DeserializeOwned>(&self, repo: &Repository, path: &str) -> Result<T> {
        let entry = match self.contents(repo, path).await? {
            Contents::Single(entry) => entry,
            Contents::Listing(_) => {
                return Err(Error::NotAFile {
                    path: path.to_string(),
                });
            }
        };
        let url = entry.download_url.ok_or_else(|| Error::MissingDownloadUrl {
            path: path.to_string(),
        })?;

        let body = self
            .fetch(repo.key(path, ContentKind::Raw), &url)
            .await?;
        serde_json::from_str(&body).map_err(|source| Error::Json {
            what: url,
            source,
        })
    }

    async fn listing(&self, repo: &Repository, path: &str) -> Result<Vec<ContentEntry>> {
        match self.contents(repo, path).await? {
            Contents::Listing(entries) => Ok(entries),
            Contents::Single(_) => Err(Error::NotADirectory {
                path: path.to_string(),
            }),
        }
    }

    async fn contents(&self, repo: &Repository, path: &str) -> Result<Contents> {
        let url = repo.contents_url(&self.api_url, path);
        let body = self
            .fetch(repo.key(path, ContentKind::Listing), &url)
            .await?;
        serde_json::from_str(&body).map_err(|source| Error::Json {
            what: url,
            source,
        })
    }

    // Cached, governed GET returning the body text
    async fn fetch(&self, key: ContentKey, url: &str) -> Result<String> {
        match self.cache.get(&key).await {
            Ok(Some(body)) => return Ok(body),
            Ok(None) => {}
            Err(e) => warn!(path = %key.path, error = %e, "Cache read failed, fetching"),
        }

        let body = self.governor.run(&key.path, || self.send(&key.path, url)).await?;
        let path = key.path.clone();
        if let Err(e) = self.cache.put(key, body.clone()).await {
            warn!(path = %path, error = %e, "Failed to cache response");
        }
        Ok(body)
    }

    async fn send(&self, resource: &str, url: &str) -> Result<String> {
        REQUEST_TOTAL.inc();
        let start_time = Instant::now();
        debug!(url, "GET");

        let mut request = self
            .http
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, concat!("font-filesize/", env!("CARGO_PKG_VERSION")));
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let res = request.send().await.map_err(|source| Error::Http {
            url: url.to_string(),
            source,
        })?;
        REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());

        let status = res.status();
        if status.is_success() {
            return res.text().await.map_err(|source| Error::Http {
                url: url.to_string(),
                source,
            });
        }

        let now = chrono::Utc::now().timestamp();
        match rate_limit_delay(status, res.headers(), now) {
            Some(reset_after) => Err(Error::RateLimited {
                resource: resource.to_string(),
                reset_after,
            }),
            None => Err(Error::Status {
                url: url.to_string(),
                status,
            }),
        }
    }
}

/// Work out whether a failed response is GitHub asking us to slow down, and
/// for how long.
pub fn rate_limit_delay(status: StatusCode, headers: &HeaderMap, now_epoch: i64) -> Option<Duration> {
    if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }

    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
    };

    // delta-seconds or an HTTP-date
    if let Some(value) = header(RETRY_AFTER.as_str()) {
        if let Ok(secs) = value.parse::<u64>() {
            return Some(Duration::from_secs(secs).max(MIN_RESET));
        }
        if let Ok(at) = chrono::DateTime::parse_from_rfc2822(&value) {
            let secs = (at.timestamp() - now_epoch).max(0) as u64;
            return Some(Duration::from_secs(secs).max(MIN_RESET));
        }
    }

    let exhausted = header("x-ratelimit-remaining").as_deref() == Some("0");
    if exhausted {
        if let Some(reset) = header("x-ratelimit-reset").and_then(|v| v.parse::<i64>().ok()) {
            let secs = (reset - now_epoch).max(0) as u64;
            return Some(Duration::from_secs(secs).max(MIN_RESET));
        }
        return Some(DEFAULT_RESET);
    }

    // a plain 403 is a permission problem, not throttling
    (status == StatusCode::TOO_MANY_REQUESTS).then_some(DEFAULT_RESET)
}
