use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use crate::error::{Error, Result};
use crate::metrics::{CACHE_HITS, CACHE_MISSES};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentKind {
    // contents API response
    Listing,
    // body behind a download_url
    Raw,
}

// Stable identity of a fetched document
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentKey {
    pub owner: String,
    pub repo: String,
    pub reference: String,
    pub path: String,
    pub kind: ContentKind,
}

// Cache entry with timestamp
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheEntry {
    pub response: String,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Option<Duration>) -> bool {
        match ttl {
            None => true,
            Some(ttl) => {
                let age = Utc::now().signed_duration_since(self.created_at);
                age.to_std().map(|age| age < ttl).unwrap_or(true)
            }
        }
    }
}

// Create a cache key (hash of the whole content identity)
pub fn make_cache_key(key: &ContentKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(&key.owner);
    hasher.update(b"\0");
    hasher.update(&key.repo);
    hasher.update(b"\0");
    hasher.update(&key.reference);
    hasher.update(b"\0");
    hasher.update(&key.path);
    hasher.update(b"\0");
    hasher.update(match key.kind {
        ContentKind::Listing => b"listing".as_slice(),
        ContentKind::Raw => b"raw".as_slice(),
    });
    format!("{:x}", hasher.finalize())
}

/// Memo of fetched documents for one client.
///
/// Always keeps entries in memory; with a directory configured they are also
/// written to disk and survive between runs.
pub struct ResponseCache {
    memory: DashMap<ContentKey, CacheEntry>,
    dir: Option<PathBuf>,
    ttl: Option<Duration>,
}

impl ResponseCache {
    pub fn in_memory() -> Self {
        Self {
            memory: DashMap::new(),
            dir: None,
            ttl: None,
        }
    }

    pub fn new(dir: Option<PathBuf>, ttl: Option<Duration>) -> Self {
        Self {
            memory: DashMap::new(),
            dir,
            ttl,
        }
    }

    pub async fn get(&self, key: &ContentKey) -> Result<Option<String>> {
        if let Some(entry) = self.memory.get(key) {
            if entry.is_fresh(self.ttl) {
                CACHE_HITS.inc();
                debug!(path = %key.path, "Cache HIT (memory)");
                return Ok(Some(entry.response.clone()));
            }
        }

        if let Some(entry) = self.read_disk(key).await? {
            if entry.is_fresh(self.ttl) {
                CACHE_HITS.inc();
                debug!(path = %key.path, "Cache HIT (disk)");
                let response = entry.response.clone();
                self.memory.insert(key.clone(), entry);
                return Ok(Some(response));
            }
        }

        CACHE_MISSES.inc();
        Ok(None)
    }

    pub async fn put(&self, key: ContentKey, response: String) -> Result<()> {
        let entry = CacheEntry {
            response,
            created_at: Utc::now(),
        };
        // memory is populated even when the disk write below fails
        self.memory.insert(key.clone(), entry.clone());

        if let Some(dir) = &self.dir {
            tokio::fs::create_dir_all(dir).await.map_err(|source| Error::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry_path(dir, &key);
            let json = serde_json::to_string(&entry).map_err(|source| Error::Json {
                what: path.display().to_string(),
                source,
            })?;
            tokio::fs::write(&path, json)
                .await
                .map_err(|source| Error::Io { path, source })?;
        }
        Ok(())
    }

    pub fn is_populated(&self, key: &ContentKey) -> bool {
        self.memory.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    async fn read_disk(&self, key: &ContentKey) -> Result<Option<CacheEntry>> {
        let Some(dir) = &self.dir else {
            return Ok(None);
        };
        let path = entry_path(dir, key);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(Error::Io { path, source }),
        };
        // a corrupt entry is just a miss, it gets overwritten on the next put
        Ok(serde_json::from_str(&raw).ok())
    }
}

fn entry_path(dir: &Path, key: &ContentKey) -> PathBuf {
    dir.join(format!("{}.json", make_cache_key(key)))
}
