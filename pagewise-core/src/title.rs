//! Chapter title resolution
//!
//! TOC titles are more trustworthy than the per-chapter titles the manifest
//! service reports, so the TOC is turned into a hint table keyed by
//! normalized chapter key before the catalog is built.

use crate::key::{normalize, strip_extension};
use crate::rules::{Heuristics, Probe};
use crate::types::{flatten_toc, TocEntry};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

/// Built-in heuristics, shared by the convenience constructors
pub(crate) fn default_heuristics() -> &'static Heuristics {
    static DEFAULT: OnceLock<Heuristics> = OnceLock::new();
    DEFAULT.get_or_init(Heuristics::default)
}

/// Clean a raw title for display.
///
/// `_` and `-` become spaces, whitespace is collapsed, and the first letter
/// is capitalized. Titles with no alphabetic character (`0001`, `***`) are
/// rejected.
pub fn sanitize_title(raw: &str) -> Option<String> {
    let spaced: String = raw
        .chars()
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .collect();
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");

    if !collapsed.chars().any(char::is_alphabetic) {
        return None;
    }

    let mut chars = collapsed.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

impl Heuristics {
    /// Whether a title reads like actual book content rather than a cover,
    /// licence or contents page
    pub fn is_likely_content_title(&self, title: &str) -> bool {
        let probe = Probe::title(title);
        probe.title.is_some() && !self.non_content_titles.matches(&probe)
    }

    /// Whether a sanitized title is front/back-matter boilerplate
    pub fn is_boilerplate_title(&self, title: &str) -> bool {
        self.hidden.matches(&Probe::title(title))
    }
}

/// [`Heuristics::is_likely_content_title`] with the built-in rules
pub fn is_likely_content_title(title: &str) -> bool {
    default_heuristics().is_likely_content_title(title)
}

/// Display titles derived from the TOC, keyed by normalized chapter key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleHints {
    hints: HashMap<String, String>,
    default_key: Option<String>,
}

impl TitleHints {
    /// An empty table, for books whose TOC could not be fetched
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build hints with the built-in heuristics
    pub fn build(toc: &[TocEntry]) -> Self {
        Self::build_with(toc, default_heuristics())
    }

    /// Build hints from a TOC in document order.
    ///
    /// Each usable title is stored under the normalized id, the normalized
    /// href, and the extensionless forms of both. The first TOC entry to
    /// claim a key keeps it.
    pub fn build_with(toc: &[TocEntry], heuristics: &Heuristics) -> Self {
        let mut hints = HashMap::new();
        let mut default_key = None;

        for entry in flatten_toc(toc) {
            let Some(title) = entry.title.as_deref().and_then(sanitize_title) else {
                continue;
            };
            if heuristics.is_boilerplate_title(&title) {
                debug!(title = %title, "skipping boilerplate toc title");
                continue;
            }

            let id = entry.id.as_deref().and_then(normalize);
            let href = entry.href.as_deref().and_then(normalize);

            if default_key.is_none() && heuristics.is_likely_content_title(&title) {
                default_key = entry
                    .id
                    .as_deref()
                    .or(entry.href.as_deref())
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string);
            }

            let keys = [id.as_deref(), href.as_deref()]
                .into_iter()
                .flatten()
                .flat_map(|key| [key, strip_extension(key)]);
            for key in keys {
                hints
                    .entry(key.to_string())
                    .or_insert_with(|| title.clone());
            }
        }

        debug!(
            hints = hints.len(),
            default_key = ?default_key,
            "built title hints"
        );

        Self { hints, default_key }
    }

    /// Hint for a chapter key: the normalized key first, then its
    /// extensionless form
    pub fn resolve(&self, key: &str) -> Option<&str> {
        let normalized = normalize(key)?;
        self.hints
            .get(&normalized)
            .or_else(|| self.hints.get(strip_extension(&normalized)))
            .map(String::as_str)
    }

    /// Key of the first TOC entry whose title looks like content
    pub fn default_chapter_key(&self) -> Option<&str> {
        self.default_key.as_deref()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.hints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("The_Beginning").as_deref(), Some("The Beginning"));
        assert_eq!(sanitize_title("  chapter-one  ").as_deref(), Some("Chapter one"));
        assert_eq!(sanitize_title("a  b\t\nc").as_deref(), Some("A b c"));
        assert_eq!(sanitize_title("0001"), None);
        assert_eq!(sanitize_title("--- * ---"), None);
        assert_eq!(sanitize_title(""), None);
        assert_eq!(sanitize_title("1. intro").as_deref(), Some("1. intro"));
    }

    #[test]
    fn test_is_likely_content_title() {
        assert!(is_likely_content_title("Chapter One"));
        assert!(is_likely_content_title("Down the Rabbit-Hole"));
        assert!(!is_likely_content_title("Cover"));
        assert!(!is_likely_content_title("The Full Project Gutenberg License"));
        assert!(!is_likely_content_title("Table of Contents"));
        assert!(!is_likely_content_title("Contents"));
        assert!(!is_likely_content_title("TOC"));
        assert!(!is_likely_content_title("  "));
    }

    #[test]
    fn test_hint_keys() {
        let toc = vec![TocEntry::new("The_Beginning", "OEBPS/Text/c1.xhtml#start").with_id("C1")];
        let hints = TitleHints::build(&toc);

        assert_eq!(hints.resolve("c1"), Some("The Beginning"));
        assert_eq!(hints.resolve("Text/c1.xhtml"), Some("The Beginning"));
        assert_eq!(hints.resolve("./OEBPS/Text/c1.xhtml#other"), Some("The Beginning"));
        assert_eq!(hints.resolve("text/c1.html"), Some("The Beginning"));
        assert_eq!(hints.resolve("c2"), None);
        assert_eq!(hints.len(), 3);
    }

    #[test]
    fn test_rejected_titles_are_not_stored() {
        let toc = vec![
            TocEntry::new("0001", "c0.html"),
            TocEntry::new("Cover", "cover.html"),
            TocEntry::new("Table of Contents", "toc.html"),
        ];
        let hints = TitleHints::build(&toc);
        assert!(hints.is_empty());
        assert_eq!(hints.default_chapter_key(), None);
    }

    #[test]
    fn test_first_claim_wins() {
        let toc = vec![
            TocEntry::new("Chapter 1", "c1.html#top"),
            TocEntry::new("Section 1.1", "c1.html#s1"),
        ];
        let hints = TitleHints::build(&toc);
        assert_eq!(hints.resolve("c1.html"), Some("Chapter 1"));
    }

    #[test]
    fn test_default_chapter_key() {
        let toc = vec![
            TocEntry::new("Contents", "toc.html"),
            TocEntry::new("Preface", "pref.html").with_id("pref"),
            TocEntry::new("Chapter 1", "c1.html"),
        ];
        let hints = TitleHints::build(&toc);
        assert_eq!(hints.default_chapter_key(), Some("pref"));
    }
}
