//! Filesystem paste store: one JSON document per paste.
//!
//! Documents land at `{dir}/{key}.json`. A save writes a private temp file
//! first and hard-links it into place, so a document is either absent or
//! complete, and a second save of the same key fails with
//! [`AppError::DuplicatePaste`] instead of overwriting.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use pastewatch_core::error::AppError;
use pastewatch_core::models::Paste;
use pastewatch_core::traits::PasteStore;
use pastewatch_core::DedupCache;
use serde::{Deserialize, Serialize};

const MAX_KEY_LEN: usize = 64;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A paste as persisted on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPaste {
    #[serde(flatten)]
    pub paste: Paste,
    pub content_hash: String,
    pub published_at: Option<DateTime<Utc>>,
    pub scraped_at: DateTime<Utc>,
}

impl StoredPaste {
    fn new(paste: &Paste) -> Self {
        Self {
            content_hash: paste.content_hash(),
            published_at: paste.published_at(),
            scraped_at: Utc::now(),
            paste: paste.clone(),
        }
    }
}

#[derive(Clone)]
pub struct FileStore {
    dir: PathBuf,
    cache: DedupCache,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_cache(dir, DedupCache::default())
    }

    pub fn with_cache(dir: impl Into<PathBuf>, cache: DedupCache) -> Self {
        Self {
            dir: dir.into(),
            cache,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn cache(&self) -> &DedupCache {
        &self.cache
    }

    /// Read a stored document back, if present.
    pub async fn load(&self, key: &str) -> Result<Option<StoredPaste>, AppError> {
        let path = self.document_path(key)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error(&path, e)),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn document_path(&self, key: &str) -> Result<PathBuf, AppError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.dir
            .join(format!(".{key}.{}.{n}.tmp", std::process::id()))
    }
}

/// Keys become file names, so only `[A-Za-z0-9_-]{1,64}` is accepted.
fn validate_key(key: &str) -> Result<(), AppError> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(AppError::StorageError(format!("Invalid paste key '{key}'")))
    }
}

fn storage_error(path: &Path, e: std::io::Error) -> AppError {
    AppError::StorageError(format!("{}: {e}", path.display()))
}

impl PasteStore for FileStore {
    async fn initialize(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| storage_error(&self.dir, e))?;
        tracing::info!(dir = %self.dir.display(), "File paste store ready");
        Ok(())
    }

    async fn is_saved(&self, key: &str) -> Result<bool, AppError> {
        let path = self.document_path(key)?;
        if self.cache.contains(key) {
            return Ok(true);
        }
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| storage_error(&path, e))
    }

    async fn save(&self, paste: &Paste) -> Result<(), AppError> {
        let path = self.document_path(&paste.key)?;
        let bytes = serde_json::to_vec_pretty(&StoredPaste::new(paste))?;

        let temp = self.temp_path(&paste.key);
        tokio::fs::write(&temp, &bytes)
            .await
            .map_err(|e| storage_error(&temp, e))?;

        let linked = tokio::fs::hard_link(&temp, &path).await;
        if let Err(e) = tokio::fs::remove_file(&temp).await {
            tracing::debug!(path = %temp.display(), error = %e, "Could not remove temp document");
        }

        match linked {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(AppError::DuplicatePaste(paste.key.clone()));
            }
            Err(e) => return Err(storage_error(&path, e)),
        }

        self.cache.insert(paste.key.clone());
        Ok(())
    }
}
