//! Offset command implementation

use anyhow::{Context, Result};
use pagewise_core::progress::{FileCache, KeyValueCache, ProgressStore};
use std::path::Path;

/// Read or write the cached scroll offset of one chapter
pub async fn offset(cache: &Path, book: &str, chapter: &str, set: Option<u32>) -> Result<()> {
    let store = FileCache::new(cache);
    let key = ProgressStore::offset_key(book, chapter);

    if let Some(value) = set {
        store
            .set(&key, value.to_string())
            .await
            .with_context(|| format!("Failed to write {}", cache.display()))?;
        tracing::info!(key = %key, offset = value, "saved scroll offset");
        return Ok(());
    }

    let value = store
        .get(&key)
        .await
        .with_context(|| format!("Failed to read {}", cache.display()))?;
    let offset: u32 = value
        .as_deref()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or_default();
    println!("{}", offset);

    Ok(())
}
