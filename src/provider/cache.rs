//! Per-model cache: read/write a serialized value keyed by target identifier.
//!
//! A miss is not an error. A corrupted entry is logged at WARNING and
//! treated as a miss — callers never see the distinction once
//! [`AbstractCache::read`] returns.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::FormatError;

/// Outcome of a cache read.
pub enum CacheRead<T> {
    Hit(T),
    Miss,
    Corrupted(FormatError),
}

#[async_trait]
pub trait AbstractCache<T>: Send + Sync {
    async fn read(&self, target: &str) -> CacheRead<T>;

    /// Best-effort write. Failure is the caller's to log; it never aborts a run.
    async fn write(&self, target: &str, value: &T) -> std::io::Result<()>;
}

/// JSON-on-disk cache rooted at a directory, one file per target.
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, target: &str) -> PathBuf {
        // Targets are often filesystem paths themselves; flatten to a safe
        // single-component filename so nested targets don't collide with
        // the cache directory's own structure.
        let sanitized: String = target
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{sanitized}.json"))
    }
}

#[async_trait]
impl<T: Serialize + DeserializeOwned + Send + Sync> AbstractCache<T> for FileCache {
    async fn read(&self, target: &str) -> CacheRead<T> {
        let path = self.path_for(target);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return CacheRead::Miss,
            Err(e) => {
                return CacheRead::Corrupted(FormatError::CorruptedCache(target.to_string(), e.to_string()));
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => CacheRead::Hit(value),
            Err(e) => CacheRead::Corrupted(FormatError::CorruptedCache(target.to_string(), e.to_string())),
        }
    }

    async fn write(&self, target: &str, value: &T) -> std::io::Result<()> {
        let path = self.path_for(target);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string(value)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        tokio::fs::write(&path, content).await
    }
}

/// Helper used by callers that need the on-disk path without performing I/O,
/// e.g. to report cache locations in diagnostics.
pub fn cache_file_path(dir: &Path, target: &str) -> PathBuf {
    FileCache::new(dir.to_path_buf()).path_for(target)
}
