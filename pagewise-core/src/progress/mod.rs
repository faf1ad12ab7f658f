//! Reading progress: per-chapter scroll offsets and the cross-device
//! bookmark
//!
//! Neither is durable state the reader depends on. Every failure here is
//! logged and swallowed so that reading, and closing the book, always
//! proceed.

mod autosave;
mod cache;

pub use autosave::Autosave;
pub use cache::{CacheResult, FileCache, KeyValueCache, MemoryCache};

use crate::config::ProgressConfig;
use crate::service::ServiceResult;
use crate::types::Bookmark;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Identity of the signed-in reader, handed to the store at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: String,
    pub auth_token: Option<String>,
}

impl SessionContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            auth_token: None,
        }
    }

    /// Attach a bearer token for the bookmark service
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

/// Remote (user, book) -> last chapter store
#[async_trait]
pub trait BookmarkService: Send + Sync {
    async fn get_bookmark(
        &self,
        session: &SessionContext,
        book_id: &str,
    ) -> ServiceResult<Option<Bookmark>>;

    /// Create or replace the bookmark
    async fn save_bookmark(
        &self,
        session: &SessionContext,
        book_id: &str,
        chapter_key: &str,
    ) -> ServiceResult<()>;
}

/// In-memory bookmark service (for testing)
#[derive(Default)]
pub struct MemoryBookmarks {
    data: RwLock<HashMap<(String, String), Bookmark>>,
}

impl MemoryBookmarks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a bookmark
    pub fn insert(&self, user_id: &str, book_id: &str, bookmark: Bookmark) {
        if let Ok(mut data) = self.data.write() {
            data.insert((user_id.to_string(), book_id.to_string()), bookmark);
        }
    }

    /// Stored bookmark, bypassing the service interface
    pub fn peek(&self, user_id: &str, book_id: &str) -> Option<Bookmark> {
        self.data
            .read()
            .ok()?
            .get(&(user_id.to_string(), book_id.to_string()))
            .cloned()
    }
}

#[async_trait]
impl BookmarkService for MemoryBookmarks {
    async fn get_bookmark(
        &self,
        session: &SessionContext,
        book_id: &str,
    ) -> ServiceResult<Option<Bookmark>> {
        Ok(self.peek(&session.user_id, book_id))
    }

    async fn save_bookmark(
        &self,
        session: &SessionContext,
        book_id: &str,
        chapter_key: &str,
    ) -> ServiceResult<()> {
        let page = self
            .peek(&session.user_id, book_id)
            .map(|b| b.page)
            .unwrap_or_default();
        let mut bookmark = Bookmark::new(chapter_key).with_page(page);
        bookmark.updated_at = Some(chrono::Utc::now());
        self.insert(&session.user_id, book_id, bookmark);
        Ok(())
    }
}

/// Scroll offsets in the local cache plus the remote bookmark
#[derive(Clone)]
pub struct ProgressStore {
    session: SessionContext,
    bookmarks: Arc<dyn BookmarkService>,
    cache: Arc<dyn KeyValueCache>,
    config: ProgressConfig,
}

impl ProgressStore {
    pub fn new(
        session: SessionContext,
        bookmarks: Arc<dyn BookmarkService>,
        cache: Arc<dyn KeyValueCache>,
    ) -> Self {
        Self {
            session,
            bookmarks,
            cache,
            config: ProgressConfig::default(),
        }
    }

    /// Replace the default progress settings
    pub fn with_config(mut self, config: ProgressConfig) -> Self {
        self.config = config;
        self
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn config(&self) -> &ProgressConfig {
        &self.config
    }

    /// Cache key for one chapter of one book
    pub fn offset_key(book_id: &str, chapter_key: &str) -> String {
        format!("{}_{}", book_id, chapter_key)
    }

    /// Overwrite the cached offset for (book, chapter)
    pub async fn save_scroll_offset(&self, book_id: &str, chapter_key: &str, offset: u32) {
        let key = Self::offset_key(book_id, chapter_key);
        match self.cache.set(&key, offset.to_string()).await {
            Ok(()) => debug!(key = %key, offset, "saved scroll offset"),
            Err(e) => debug!(key = %key, error = %e, "failed to save scroll offset"),
        }
    }

    /// Cached offset for (book, chapter), 0 when absent or unreadable
    pub async fn load_scroll_offset(&self, book_id: &str, chapter_key: &str) -> u32 {
        let key = Self::offset_key(book_id, chapter_key);
        match self.cache.get(&key).await {
            Ok(Some(value)) => value.trim().parse().unwrap_or_else(|_| {
                debug!(key = %key, value = %value, "ignoring malformed scroll offset");
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                debug!(key = %key, error = %e, "failed to read scroll offset");
                0
            }
        }
    }

    /// Upsert the remote bookmark. An empty key is replaced by the
    /// configured fallback. Returns whether the service accepted it.
    pub async fn save_bookmark(&self, book_id: &str, chapter_key: &str) -> bool {
        let chapter_key = match chapter_key.trim() {
            "" => self.config.fallback_chapter_key.as_str(),
            key => key,
        };

        match self
            .bookmarks
            .save_bookmark(&self.session, book_id, chapter_key)
            .await
        {
            Ok(()) => {
                debug!(book_id, chapter_key, "saved bookmark");
                true
            }
            Err(e) => {
                warn!(book_id, chapter_key, error = %e, "failed to save bookmark");
                false
            }
        }
    }

    /// Fetch the remote bookmark, `None` on absence or failure
    pub async fn load_bookmark(&self, book_id: &str) -> Option<Bookmark> {
        match self.bookmarks.get_bookmark(&self.session, book_id).await {
            Ok(bookmark) => bookmark,
            Err(e) => {
                warn!(book_id, error = %e, "failed to load bookmark");
                None
            }
        }
    }
}
