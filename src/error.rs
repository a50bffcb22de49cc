use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    // Server asked us to back off; the governor absorbs this one
    #[error("rate limit exceeded for {resource}, resets in {reset_after:?}")]
    RateLimited {
        resource: String,
        reset_after: Duration,
    },

    #[error("unable to fetch {url}: status code {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid json in {what}: {source}")]
    Json {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} is not a directory")]
    NotADirectory { path: String },

    #[error("{path} is not a file")]
    NotAFile { path: String },

    #[error("{path} has no download url")]
    MissingDownloadUrl { path: String },

    #[error("io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("font task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("request governor is closed")]
    Closed,
}
