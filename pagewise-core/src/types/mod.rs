//! Data types exchanged with the EPUB and bookmark services

mod bookmark;
mod chapter;
mod content;
mod toc;

pub use bookmark::Bookmark;
pub use chapter::{ChapterEntry, ChapterManifest};
pub use content::ChapterContent;
pub use toc::{flatten_toc, EpubMetadata, TocEntry};
