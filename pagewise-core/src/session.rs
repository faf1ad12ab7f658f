//! The reading session: one open book on one screen
//!
//! Drives the data flow from the EPUB service through title hints, catalog
//! and cursor to the render surface, and keeps reading progress in step.
//! All methods take `&mut self`; the session lives on a single sequential
//! timeline and only the autosave timer and the bookmark fetch run beside
//! it.

use crate::catalog::Catalog;
use crate::config::ReaderConfig;
use crate::cursor::{Cursor, CursorState, Direction};
use crate::error::{PagewiseError, Result, ServiceError};
use crate::progress::{Autosave, ProgressStore};
use crate::rules::Heuristics;
use crate::service::{EpubService, RenderSurface, ServiceResult};
use crate::title::TitleHints;
use crate::types::{Bookmark, ChapterContent, ChapterEntry};
use std::borrow::Cow;
use std::sync::Arc;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// The book being read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRef {
    pub book_id: String,

    /// URL the EPUB services are asked about; also the render base URL
    pub source_url: String,
}

impl BookRef {
    pub fn new(book_id: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            book_id: book_id.into(),
            source_url: source_url.into(),
        }
    }
}

/// A content request tagged with its generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRequest {
    generation: u64,
    key: String,
}

impl ChapterRequest {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Issues monotonically increasing request generations; only the latest
/// one may update the screen
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    latest: u64,
}

impl RequestTracker {
    pub fn issue(&mut self, key: impl Into<String>) -> ChapterRequest {
        self.latest += 1;
        ChapterRequest {
            generation: self.latest,
            key: key.into(),
        }
    }

    pub fn is_latest(&self, request: &ChapterRequest) -> bool {
        request.generation == self.latest
    }
}

/// A chapter whose content has been handed to the surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedChapter {
    pub key: String,
    pub position: usize,
    pub title: Option<String>,

    /// Offset the surface will be scrolled to once rendering completes
    pub scroll_offset: u32,
}

/// What applying a bookmark did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkOutcome {
    /// No bookmark, or one without a chapter
    NoBookmark,

    /// Catalog not built yet; recorded as the pending resume key
    Deferred(String),

    /// Cursor moved; the caller should open this chapter
    Navigate(String),

    /// Bookmark names the chapter already open
    AlreadyCurrent,

    /// Bookmark names a chapter this catalog does not have
    Unresolved(String),
}

/// Where a link tapped inside chapter content leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Another chapter of this book
    Chapter {
        key: String,
        fragment: Option<String>,
    },

    /// An anchor in the displayed chapter
    SamePage { fragment: String },

    /// Anything else; left to the host
    External(String),
}

impl LinkTarget {
    /// Whether the session handles the link itself
    pub fn is_handled(&self) -> bool {
        matches!(self, LinkTarget::Chapter { .. })
    }
}

/// One open book
pub struct ReadingSession {
    id: Uuid,
    book: BookRef,
    epub: Arc<dyn EpubService>,
    progress: ProgressStore,
    surface: Arc<dyn RenderSurface>,
    heuristics: Arc<Heuristics>,
    hints: TitleHints,
    catalog: Catalog,
    catalog_ready: bool,
    cursor: Cursor,
    requests: RequestTracker,
    displayed: Option<String>,
    autosave: Option<Autosave>,
    pending_scroll: Option<u32>,
    bookmark_rx: Option<oneshot::Receiver<Option<Bookmark>>>,
    notice: Option<String>,
}

impl ReadingSession {
    pub fn new(
        book: BookRef,
        epub: Arc<dyn EpubService>,
        progress: ProgressStore,
        surface: Arc<dyn RenderSurface>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            book,
            epub,
            progress,
            surface,
            heuristics: Arc::new(Heuristics::default()),
            hints: TitleHints::empty(),
            catalog: Catalog::default(),
            catalog_ready: false,
            cursor: Cursor::new(),
            requests: RequestTracker::default(),
            displayed: None,
            autosave: None,
            pending_scroll: None,
            bookmark_rx: None,
            notice: None,
        }
    }

    /// Apply heuristics and progress settings
    pub fn with_config(mut self, config: ReaderConfig) -> Self {
        self.heuristics = Arc::new(config.heuristics);
        self.progress = self.progress.with_config(config.progress);
        self
    }

    /// Apply configuration read from `PAGEWISE_*` variables supplied by
    /// `lookup`. See [`ReaderConfig::from_lookup`].
    pub fn with_config_from<F>(self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = ReaderConfig::from_lookup(lookup)?;
        Ok(self.with_config(config))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn book(&self) -> &BookRef {
        &self.book
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn hints(&self) -> &TitleHints {
        &self.hints
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn state(&self) -> CursorState {
        self.cursor.state()
    }

    pub fn current_key(&self) -> Option<&str> {
        self.cursor.current()
    }

    /// Chapter whose content is on the surface
    pub fn displayed_key(&self) -> Option<&str> {
        self.displayed.as_deref()
    }

    /// One-line message for the user after a manifest or content failure
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Load the book: TOC hints, then the manifest, with the bookmark
    /// fetched alongside. Returns the chapter to open first.
    ///
    /// A bookmark that arrives before the catalog is built becomes the
    /// pending resume key; a later one is applied by [`Self::await_bookmark`].
    pub async fn start(&mut self) -> Result<Option<String>> {
        info!(session = %self.id, book_id = %self.book.book_id, "starting reading session");

        let hints = self.fetch_hints().await;

        let manifest = self.epub.get_chapters(&self.book.source_url);
        let mut bookmark_rx = Some(self.spawn_bookmark_fetch());
        let manifest = manifest.await;

        if let Some(rx) = bookmark_rx.as_mut() {
            match rx.try_recv() {
                Ok(bookmark) => {
                    bookmark_rx = None;
                    if let Some(bookmark) = bookmark {
                        self.apply_bookmark(&bookmark);
                    }
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Closed) => bookmark_rx = None,
            }
        }

        let manifest = match manifest {
            Ok(manifest) => manifest,
            Err(e) => return Err(self.fail("Couldn't load the chapter list", e)),
        };

        self.install_catalog(manifest.chapters, hints);
        self.bookmark_rx = bookmark_rx;
        Ok(self.cursor.current().map(str::to_string))
    }

    /// Rebuild the catalog after the book is reopened. Any pending resume
    /// key is retried before the heuristics.
    pub async fn reload(&mut self) -> Result<Option<String>> {
        let hints = self.fetch_hints().await;
        let manifest = match self.epub.get_chapters(&self.book.source_url).await {
            Ok(manifest) => manifest,
            Err(e) => return Err(self.fail("Couldn't load the chapter list", e)),
        };
        self.install_catalog(manifest.chapters, hints);
        Ok(self.cursor.current().map(str::to_string))
    }

    /// Wait for the bookmark fetched by [`Self::start`], if it has not been
    /// consumed yet, and apply it
    pub async fn await_bookmark(&mut self) -> BookmarkOutcome {
        let Some(rx) = self.bookmark_rx.take() else {
            return BookmarkOutcome::NoBookmark;
        };
        match rx.await {
            Ok(Some(bookmark)) => self.apply_bookmark(&bookmark),
            _ => BookmarkOutcome::NoBookmark,
        }
    }

    /// Start, open the initial chapter, then follow the bookmark if it
    /// points elsewhere
    pub async fn open(&mut self) -> Result<Option<LoadedChapter>> {
        let Some(initial) = self.start().await? else {
            self.notice = Some("No chapters available".to_string());
            return Ok(None);
        };

        let first = self.open_chapter(&initial).await;
        match self.await_bookmark().await {
            BookmarkOutcome::Navigate(key) => self.open_chapter(&key).await,
            _ => first,
        }
    }

    /// Resume from a bookmark.
    ///
    /// Before the catalog exists the key is recorded as pending. Afterwards
    /// the cursor moves only when the bookmark names a different chapter.
    pub fn apply_bookmark(&mut self, bookmark: &Bookmark) -> BookmarkOutcome {
        let Some(key) = bookmark.resume_key() else {
            return BookmarkOutcome::NoBookmark;
        };

        if !self.catalog_ready {
            debug!(session = %self.id, key, "bookmark arrived before catalog");
            self.cursor.set_pending(key);
            return BookmarkOutcome::Deferred(key.to_string());
        }

        let Some(canonical) = self
            .catalog
            .index_of(key)
            .and_then(|position| self.catalog.key_at(position))
            .map(str::to_string)
        else {
            warn!(session = %self.id, key, "bookmark names an unknown chapter");
            return BookmarkOutcome::Unresolved(key.to_string());
        };

        if self.cursor.current() == Some(canonical.as_str()) {
            return BookmarkOutcome::AlreadyCurrent;
        }

        self.cursor.move_to(&self.catalog, &canonical);
        info!(session = %self.id, key = %canonical, "resuming from bookmark");
        BookmarkOutcome::Navigate(canonical)
    }

    /// Fetch and display a chapter. Returns `None` for keys the catalog
    /// does not know and for responses superseded by a newer request.
    pub async fn open_chapter(&mut self, key: &str) -> Result<Option<LoadedChapter>> {
        let Some(request) = self.begin_chapter_request(key) else {
            debug!(session = %self.id, key, "no such chapter");
            return Ok(None);
        };
        let result = self
            .epub
            .get_chapter_content(&self.book.source_url, request.key())
            .await;
        self.finish_chapter_request(request, result).await
    }

    /// Tag a content request for `key`, superseding every earlier one
    pub fn begin_chapter_request(&mut self, key: &str) -> Option<ChapterRequest> {
        let canonical = self
            .catalog
            .index_of(key)
            .and_then(|position| self.catalog.key_at(position))?
            .to_string();
        let request = self.requests.issue(canonical);
        debug!(
            session = %self.id,
            key = request.key(),
            generation = request.generation(),
            "requesting chapter"
        );
        Some(request)
    }

    /// Complete a content request. Stale responses are discarded without
    /// touching any state.
    pub async fn finish_chapter_request(
        &mut self,
        request: ChapterRequest,
        result: ServiceResult<ChapterContent>,
    ) -> Result<Option<LoadedChapter>> {
        if !self.requests.is_latest(&request) {
            debug!(
                session = %self.id,
                key = request.key(),
                generation = request.generation(),
                "discarding stale chapter response"
            );
            return Ok(None);
        }

        let content = match result {
            Ok(content) => content,
            Err(e) => return Err(self.fail("Couldn't load this chapter", e)),
        };

        self.capture_scroll_offset().await;

        let key = request.key;
        self.cursor.move_to(&self.catalog, &key);
        let position = self.catalog.index_of(&key).unwrap_or_default();
        let scroll_offset = self
            .progress
            .load_scroll_offset(&self.book.book_id, &key)
            .await;

        self.surface
            .render_html(&content.html_content, &self.book.source_url);
        self.pending_scroll = Some(scroll_offset);
        self.displayed = Some(key.clone());
        self.notice = None;

        let title = self
            .chapter_title(&key)
            .or_else(|| content.effective_title());
        info!(session = %self.id, key = %key, position, scroll_offset, "opened chapter");

        Ok(Some(LoadedChapter {
            key,
            position,
            title,
            scroll_offset,
        }))
    }

    /// The surface finished rendering: restore the saved scroll offset and
    /// start saving the reader's position from there
    pub fn on_render_complete(&mut self) {
        let Some(offset) = self.pending_scroll.take() else {
            return;
        };
        self.surface.scroll_to(offset);
        if let Some(key) = self.displayed.clone() {
            self.autosave = Some(Autosave::spawn(
                self.progress.clone(),
                self.surface.clone(),
                self.book.book_id.clone(),
                key,
            ));
        }
    }

    /// Neighbouring navigable chapter, if any
    pub fn peek(&self, direction: Direction) -> Option<String> {
        self.cursor.peek(&self.catalog, direction)
    }

    /// Whether the prev/next control for `direction` is enabled
    pub fn can_go(&self, direction: Direction) -> bool {
        self.cursor.can_step(&self.catalog, direction)
    }

    /// Open the neighbouring chapter. At either end nothing changes and
    /// `None` is returned.
    pub async fn go(&mut self, direction: Direction) -> Result<Option<LoadedChapter>> {
        match self.peek(direction) {
            Some(key) => self.open_chapter(&key).await,
            None => Ok(None),
        }
    }

    /// Display title for any key addressing a chapter of this book
    pub fn chapter_title(&self, key: &str) -> Option<String> {
        self.hints
            .resolve(key)
            .map(str::to_string)
            .or_else(|| self.catalog.title_for(key))
    }

    /// Classify a link the surface is about to follow
    pub fn resolve_link(&self, url: &str) -> LinkTarget {
        let trimmed = url.trim();
        let relative = match self.strip_book_base(trimmed) {
            Some(relative) => relative,
            None if has_scheme(trimmed) => return LinkTarget::External(url.to_string()),
            None => trimmed,
        };

        let decoded = urlencoding::decode(relative).unwrap_or(Cow::Borrowed(relative));
        let (path, fragment) = match decoded.split_once('#') {
            Some((path, fragment)) => (path, Some(fragment)),
            None => (&*decoded, None),
        };
        let fragment = fragment.filter(|f| !f.is_empty()).map(str::to_string);

        if path.trim().is_empty() {
            return match fragment {
                Some(fragment) => LinkTarget::SamePage { fragment },
                None => LinkTarget::External(url.to_string()),
            };
        }

        match self
            .catalog
            .index_of(path)
            .and_then(|position| self.catalog.key_at(position))
        {
            Some(key) => LinkTarget::Chapter {
                key: key.to_string(),
                fragment,
            },
            None => LinkTarget::External(url.to_string()),
        }
    }

    /// Save the scroll offset and the bookmark, then stop the timer.
    ///
    /// The bookmark outcome is returned for logging; a failure does not
    /// keep the screen open.
    pub async fn close(mut self) -> bool {
        self.capture_scroll_offset().await;
        let key = self.cursor.current().unwrap_or_default().to_string();
        let saved = self.progress.save_bookmark(&self.book.book_id, &key).await;
        info!(session = %self.id, key = %key, saved, "closed reading session");
        saved
    }

    async fn fetch_hints(&self) -> TitleHints {
        match self.epub.get_metadata(&self.book.source_url).await {
            Ok(metadata) => TitleHints::build_with(&metadata.toc_entries, &self.heuristics),
            Err(e) => {
                warn!(session = %self.id, error = %e, "no table of contents, titles from manifest only");
                TitleHints::empty()
            }
        }
    }

    fn spawn_bookmark_fetch(&self) -> oneshot::Receiver<Option<Bookmark>> {
        let (tx, rx) = oneshot::channel();
        let progress = self.progress.clone();
        let book_id = self.book.book_id.clone();
        tokio::spawn(async move {
            let bookmark = progress.load_bookmark(&book_id).await;
            // The session may be gone already
            let _ = tx.send(bookmark);
        });
        rx
    }

    fn install_catalog(&mut self, manifest: Vec<ChapterEntry>, hints: TitleHints) {
        self.catalog = Catalog::build_with(manifest, &hints, &self.heuristics);
        self.hints = hints;
        self.catalog_ready = true;
        self.cursor.reset();
        self.cursor.select_initial(
            &self.catalog,
            self.hints.default_chapter_key(),
            &self.heuristics,
        );

        if self.catalog.is_empty() {
            self.notice = Some("No chapters available".to_string());
        }
        info!(
            session = %self.id,
            chapters = self.catalog.len(),
            initial = ?self.cursor.current(),
            "catalog ready"
        );
    }

    /// Write the displayed chapter's offset and stop its timer. A chapter
    /// still waiting for its restore keeps the offset saved earlier.
    async fn capture_scroll_offset(&mut self) {
        self.autosave = None;
        if let Some(pending) = self.pending_scroll.take() {
            debug!(session = %self.id, key = ?self.displayed, pending, "left chapter before restore");
            return;
        }
        if let Some(key) = self.displayed.as_deref() {
            let offset = self.surface.current_scroll_offset();
            self.progress
                .save_scroll_offset(&self.book.book_id, key, offset)
                .await;
        }
    }

    fn fail(&mut self, what: &str, error: ServiceError) -> PagewiseError {
        warn!(session = %self.id, error = %error, "{}", what);
        self.notice = Some(format!("{}: {}", what, error));
        error.into()
    }

    fn strip_book_base<'a>(&self, url: &'a str) -> Option<&'a str> {
        let source = self.book.source_url.trim_end_matches('/');
        if source.is_empty() {
            return None;
        }
        let base = match source.rfind('/') {
            Some(pos) if has_scheme(source) && !source[..pos].ends_with('/') => &source[..pos],
            _ => source,
        };

        [source, base]
            .into_iter()
            .find_map(|prefix| url.strip_prefix(prefix))
            .map(|rest| rest.trim_start_matches('/'))
    }
}

fn has_scheme(url: &str) -> bool {
    match url.split_once(':') {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}
