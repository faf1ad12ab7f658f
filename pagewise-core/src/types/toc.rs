//! Table of contents types

use serde::{Deserialize, Serialize};

/// A single entry in the table of contents, as returned by the EPUB
/// metadata service
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TocEntry {
    /// Manifest id the entry points at, when the service knows it
    #[serde(default)]
    pub id: Option<String>,

    /// Raw display title
    #[serde(default)]
    pub title: Option<String>,

    /// Target href, possibly carrying a `#fragment`
    #[serde(default)]
    pub href: Option<String>,

    /// Nesting level (0 = top level)
    #[serde(default)]
    pub level: u32,

    /// Child entries for nested TOC
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    /// Create a new TOC entry
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            href: Some(href.into()),
            ..Self::default()
        }
    }

    /// Set the manifest id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the nesting level
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    /// Add child entries
    pub fn with_children(mut self, children: Vec<TocEntry>) -> Self {
        self.children = children;
        self
    }

    /// This entry followed by its descendants, depth first
    pub fn flatten(&self) -> Vec<&TocEntry> {
        let mut result = vec![self];
        for child in &self.children {
            result.extend(child.flatten());
        }
        result
    }
}

/// Flatten a TOC forest into document order
pub fn flatten_toc(entries: &[TocEntry]) -> Vec<&TocEntry> {
    entries.iter().flat_map(TocEntry::flatten).collect()
}

/// Response of the EPUB metadata service
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EpubMetadata {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub toc_entries: Vec<TocEntry>,
}
