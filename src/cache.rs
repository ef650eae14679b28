//! Disk cache for `/transcript` responses.
//!
//! Entries are stored as `{cache_dir}/{key}.json`. The file modification time
//! is the write timestamp; staleness is only checked when an entry is read.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde_json::Value;
use tokio::fs;

use crate::request::is_truthy;

/// Deterministic key for one combination of request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// `{video_id}|{target}|{langs}|{force}` with `/` replaced so the key stays a
    /// single path component.
    pub fn new(
        video_id: &str,
        target_language: Option<&str>,
        languages: &[String],
        force_translate: bool,
    ) -> Self {
        let langs = languages
            .iter()
            .map(|lang| lang.trim())
            .filter(|lang| !lang.is_empty())
            .collect::<Vec<_>>()
            .join("-");
        let force = if force_translate { '1' } else { '0' };

        let key = format!(
            "{}|{}|{}|{}",
            video_id,
            target_language.unwrap_or_default(),
            langs,
            force
        );
        Self(key.replace('/', "_"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub dir: PathBuf,
    pub default_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct ResponseCache {
    config: CacheConfig,
}

impl ResponseCache {
    pub fn new(config: CacheConfig) -> Self {
        Self { config }
    }

    /// Maximum entry age used when a request does not name its own.
    pub fn default_ttl(&self) -> Duration {
        self.config.default_ttl
    }

    /// Creates the cache directory up front. Failure is logged; `store` retries.
    pub async fn prepare(&self) {
        if let Err(e) = fs::create_dir_all(&self.config.dir).await {
            log::warn!("ResponseCache: failed to create dir {:?}: {}", self.config.dir, e);
        }
    }

    pub async fn lookup(&self, key: &CacheKey, ttl: Duration) -> Option<Value> {
        self.lookup_at(key, ttl, SystemTime::now()).await
    }

    /// Returns the stored payload if it is younger than `ttl` at `now`.
    /// Missing, stale, unreadable and corrupt entries are all misses.
    pub async fn lookup_at(&self, key: &CacheKey, ttl: Duration, now: SystemTime) -> Option<Value> {
        let path = self.entry_path(key);

        let written_at = fs::metadata(&path).await.ok()?.modified().ok()?;
        let age = now.duration_since(written_at).unwrap_or_default();
        if age > ttl {
            log::debug!("ResponseCache: stale {:?} (age {:?})", path, age);
            return None;
        }

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("ResponseCache: failed to read {:?}: {}", path, e);
                return None;
            }
        };
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(payload) if is_truthy(&payload) => {
                log::debug!("ResponseCache: hit {:?}", path);
                Some(payload)
            }
            Ok(_) => None,
            Err(e) => {
                log::warn!("ResponseCache: ignoring corrupt entry {:?}: {}", path, e);
                None
            }
        }
    }

    /// Writes or overwrites the entry. Never fails the caller.
    pub async fn store(&self, key: &CacheKey, payload: &Value) {
        if let Err(e) = fs::create_dir_all(&self.config.dir).await {
            log::warn!("ResponseCache: failed to create dir {:?}: {}", self.config.dir, e);
            return;
        }
        let path = self.entry_path(key);
        let bytes = match serde_json::to_vec(payload) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("ResponseCache: failed to serialize {:?}: {}", path, e);
                return;
            }
        };
        if let Err(e) = fs::write(&path, bytes).await {
            log::warn!("ResponseCache: failed to write {:?}: {}", path, e);
        } else {
            log::debug!("ResponseCache: saved {:?}", path);
        }
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.config.dir.join(format!("{}.json", key.as_str()))
    }
}
