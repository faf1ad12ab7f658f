//! Chapter manifest types

use serde::{Deserialize, Serialize};

/// One chapter as listed by the EPUB manifest service.
///
/// `display_title` and `position_hint` are filled in once, while the entry
/// is admitted into a [`Catalog`](crate::catalog::Catalog); entries are not
/// mutated after that.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChapterEntry {
    /// Manifest id
    #[serde(default)]
    pub id: Option<String>,

    /// Manifest href
    #[serde(default)]
    pub href: Option<String>,

    /// Title reported by the manifest service
    #[serde(default, rename = "title")]
    pub raw_title: Option<String>,

    /// Nesting level reported by the manifest service
    #[serde(default)]
    pub level: Option<u32>,

    /// Resolved display title
    #[serde(default, skip_deserializing)]
    pub display_title: Option<String>,

    /// 0-based position within the catalog
    #[serde(default, skip_deserializing)]
    pub position_hint: Option<usize>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ChapterEntry {
    /// Create an entry addressed by manifest id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Create an entry addressed only by href
    pub fn from_href(href: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            ..Self::default()
        }
    }

    /// Set the href
    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    /// Set the raw title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.raw_title = Some(title.into());
        self
    }

    /// Non-empty manifest id
    pub fn id(&self) -> Option<&str> {
        non_empty(&self.id)
    }

    /// Non-empty manifest href
    pub fn href(&self) -> Option<&str> {
        non_empty(&self.href)
    }

    /// Non-empty raw title
    pub fn raw_title(&self) -> Option<&str> {
        non_empty(&self.raw_title)
    }

    /// The key used to request this chapter's content: id, else href
    pub fn key(&self) -> Option<&str> {
        self.id().or_else(|| self.href())
    }

    /// Display title, falling back to the raw title
    pub fn title(&self) -> Option<&str> {
        non_empty(&self.display_title).or_else(|| self.raw_title())
    }
}

/// Response of the EPUB manifest service
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChapterManifest {
    #[serde(default)]
    pub chapters: Vec<ChapterEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_are_absent() {
        let entry = ChapterEntry::new("  ").with_href("c1.html").with_title("");
        assert_eq!(entry.id(), None);
        assert_eq!(entry.key(), Some("c1.html"));
        assert_eq!(entry.title(), None);
    }

    #[test]
    fn test_manifest_wire_format() {
        let json = r#"{
            "chapters": [
                { "id": "c1", "href": "OEBPS/c1.html", "title": "Chapter_One", "level": 0 },
                { "id": "c2" }
            ]
        }"#;
        let manifest: ChapterManifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.chapters.len(), 2);
        assert_eq!(manifest.chapters[0].raw_title(), Some("Chapter_One"));
        assert_eq!(manifest.chapters[0].display_title, None);
        assert_eq!(manifest.chapters[1].key(), Some("c2"));
    }
}
