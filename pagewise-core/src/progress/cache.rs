//! Local key-value cache backing scroll-offset persistence

use crate::error::CacheError;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Result type for cache operations
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// String key-value store local to the device
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Value stored under `key`, if any
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: String) -> CacheResult<()>;
}

/// In-memory cache (for testing and ephemeral sessions)
#[derive(Default)]
pub struct MemoryCache {
    data: std::sync::RwLock<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E>(_: E) -> CacheError {
    CacheError::Backend("cache lock poisoned".to_string())
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.data.read().map_err(poisoned)?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> CacheResult<()> {
        self.data
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value);
        Ok(())
    }
}

/// Cache persisted as a single JSON object on disk.
///
/// The file is read on first access and rewritten atomically (temp file,
/// then rename) on every change.
pub struct FileCache {
    path: PathBuf,
    data: Mutex<Option<BTreeMap<String, String>>>,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> CacheResult<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => serde_json::from_str(&data).map_err(|e| CacheError::Corrupt {
                key: self.path.display().to_string(),
                reason: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(CacheError::Backend(e.to_string())),
        }
    }

    async fn save(&self, data: &BTreeMap<String, String>) -> CacheResult<()> {
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| CacheError::Backend(e.to_string()))?;
            }
        }

        // Same directory keeps the rename on one filesystem
        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, json)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }
}

#[async_trait]
impl KeyValueCache for FileCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut guard = self.data.lock().await;
        if guard.is_none() {
            *guard = Some(self.load().await?);
        }
        Ok(guard.as_ref().and_then(|data| data.get(key).cloned()))
    }

    async fn set(&self, key: &str, value: String) -> CacheResult<()> {
        let mut guard = self.data.lock().await;
        let mut data = match guard.take() {
            Some(data) => data,
            None => self.load().await?,
        };
        data.insert(key.to_string(), value);
        let result = self.save(&data).await;
        *guard = Some(data);
        result
    }
}
