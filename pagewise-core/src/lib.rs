//! Pagewise Core Library
//!
//! This crate turns the raw chapter manifest and table of contents of a
//! remotely parsed EPUB into a clean, navigable chapter catalog, decides
//! which chapter to open first, and keeps per-chapter scroll offsets and the
//! cross-device bookmark in step while the book is read.

pub mod catalog;
pub mod config;
pub mod cursor;
pub mod error;
pub mod key;
pub mod progress;
pub mod rules;
pub mod service;
pub mod session;
pub mod title;
pub mod types;

pub use catalog::{BuildStats, Catalog, CatalogRow};
pub use config::{ProgressConfig, ReaderConfig};
pub use cursor::{select_initial, step, Cursor, CursorState, Direction};
pub use error::{CacheError, ConfigError, PagewiseError, Result, ServiceError};
pub use progress::{
    BookmarkService, FileCache, KeyValueCache, MemoryBookmarks, MemoryCache, ProgressStore,
    SessionContext,
};
pub use rules::{Field, Heuristics, Matcher, Rule, RuleSet};
pub use service::{EpubService, RenderSurface, StaticEpubService};
pub use session::{BookRef, BookmarkOutcome, LinkTarget, LoadedChapter, ReadingSession};
pub use title::{is_likely_content_title, TitleHints};
pub use types::{Bookmark, ChapterContent, ChapterEntry, ChapterManifest, EpubMetadata, TocEntry};
