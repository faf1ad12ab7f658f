//! Contracts for the collaborators the engine talks to
//!
//! The EPUB container is parsed remotely; the engine only sees its TOC,
//! chapter manifest and per-chapter HTML through [`EpubService`]. Whatever
//! displays the HTML implements [`RenderSurface`].

use crate::error::ServiceError;
use crate::key;
use crate::types::{ChapterContent, ChapterManifest, EpubMetadata};
use async_trait::async_trait;

/// Result type for remote service calls
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Remote EPUB parsing service
#[async_trait]
pub trait EpubService: Send + Sync {
    /// Book metadata including the table of contents
    async fn get_metadata(&self, source_url: &str) -> ServiceResult<EpubMetadata>;

    /// Raw chapter manifest in spine order
    async fn get_chapters(&self, source_url: &str) -> ServiceResult<ChapterManifest>;

    /// HTML of one chapter
    async fn get_chapter_content(
        &self,
        source_url: &str,
        chapter_key: &str,
    ) -> ServiceResult<ChapterContent>;
}

/// Whatever displays chapter HTML and owns the scroll position
pub trait RenderSurface: Send + Sync {
    /// Replace the displayed document
    fn render_html(&self, document: &str, base_url: &str);

    /// Current vertical scroll offset
    fn current_scroll_offset(&self) -> u32;

    /// Scroll to a vertical offset
    fn scroll_to(&self, offset: u32);
}

/// EPUB service answering from data already in memory (tests, offline
/// dumps)
#[derive(Debug, Clone, Default)]
pub struct StaticEpubService {
    metadata: EpubMetadata,
    manifest: ChapterManifest,
    contents: Vec<ChapterContent>,
}

impl StaticEpubService {
    pub fn new(metadata: EpubMetadata, manifest: ChapterManifest) -> Self {
        Self {
            metadata,
            manifest,
            contents: Vec::new(),
        }
    }

    /// Add chapter HTML, addressable by any key equivalent to its own
    pub fn with_content(mut self, content: ChapterContent) -> Self {
        self.contents.push(content);
        self
    }
}

#[async_trait]
impl EpubService for StaticEpubService {
    async fn get_metadata(&self, _source_url: &str) -> ServiceResult<EpubMetadata> {
        Ok(self.metadata.clone())
    }

    async fn get_chapters(&self, _source_url: &str) -> ServiceResult<ChapterManifest> {
        Ok(self.manifest.clone())
    }

    async fn get_chapter_content(
        &self,
        _source_url: &str,
        chapter_key: &str,
    ) -> ServiceResult<ChapterContent> {
        self.contents
            .iter()
            .find(|c| key::normalize(&c.chapter_key) == key::normalize(chapter_key))
            .or_else(|| {
                self.contents
                    .iter()
                    .find(|c| key::equivalent(&c.chapter_key, chapter_key))
            })
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(chapter_key.to_string()))
    }
}
