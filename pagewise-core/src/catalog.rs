//! The navigable chapter catalog of one book
//!
//! Built in two phases so each invariant can be checked on its own:
//!
//! 1. **admit**: resolve titles, drop entries the `hidden` rules reject,
//!    drop later duplicates of a unique key. Produces the final sequence.
//! 2. **index**: map every addressing variant of every admitted entry to
//!    its position.

use crate::key::{self, KeyVariants};
use crate::rules::{Heuristics, Probe};
use crate::title::{default_heuristics, sanitize_title, TitleHints};
use crate::types::ChapterEntry;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Counters describing what the admit phase threw away
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    /// Manifest entries received
    pub received: usize,

    /// Entries rejected as non-displayable
    pub hidden: usize,

    /// Entries dropped as duplicates of an earlier unique key
    pub duplicates: usize,
}

/// Position lookup by addressing tier. Within a tier the first entry to
/// claim a variant keeps it.
#[derive(Debug, Clone, Default)]
struct CatalogIndex {
    exact: HashMap<String, usize>,
    by_file_name: HashMap<String, usize>,
    by_stem: HashMap<String, usize>,
}

impl CatalogIndex {
    fn build(entries: &[ChapterEntry]) -> Self {
        let mut index = Self::default();

        // Content keys claim their exact form first so that key_at always
        // looks up back to its own position
        for (position, entry) in entries.iter().enumerate() {
            if let Some(normalized) = key::normalize_opt(entry.key()) {
                index.claim(Tier::Exact, normalized, position);
            }
        }

        for (position, entry) in entries.iter().enumerate() {
            for raw in [entry.id(), entry.href()].into_iter().flatten() {
                let Some(variants) = KeyVariants::of(raw) else {
                    continue;
                };
                index.claim(Tier::Exact, variants.normalized, position);
                index.claim(Tier::FileName, variants.file_name, position);
                index.claim(Tier::Stem, variants.stem, position);
            }
        }
        index
    }

    fn claim(&mut self, tier: Tier, variant: String, position: usize) {
        if variant.is_empty() {
            return;
        }
        let map = match tier {
            Tier::Exact => &mut self.exact,
            Tier::FileName => &mut self.by_file_name,
            Tier::Stem => &mut self.by_stem,
        };
        map.entry(variant).or_insert(position);
    }

    fn lookup(&self, raw: &str) -> Option<usize> {
        let variants = KeyVariants::of(raw)?;
        self.exact
            .get(&variants.normalized)
            .or_else(|| self.by_file_name.get(&variants.file_name))
            .or_else(|| self.by_stem.get(&variants.stem))
            .copied()
    }

    fn len(&self) -> usize {
        self.exact.len() + self.by_file_name.len() + self.by_stem.len()
    }
}

#[derive(Debug, Clone, Copy)]
enum Tier {
    Exact,
    FileName,
    Stem,
}

/// The filtered, de-duplicated, ordered and indexed chapter sequence
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<ChapterEntry>,
    navigable: Vec<bool>,
    index: CatalogIndex,
    stats: BuildStats,
}

impl Catalog {
    /// Build with the built-in heuristics
    pub fn build(manifest: Vec<ChapterEntry>, hints: &TitleHints) -> Self {
        Self::build_with(manifest, hints, default_heuristics())
    }

    /// Build from a raw manifest, applying TOC title hints.
    ///
    /// An empty manifest yields an empty catalog.
    pub fn build_with(
        manifest: Vec<ChapterEntry>,
        hints: &TitleHints,
        heuristics: &Heuristics,
    ) -> Self {
        let (entries, stats) = admit(manifest, hints, heuristics);
        let index = CatalogIndex::build(&entries);
        let navigable = entries
            .iter()
            .map(|entry| is_navigable(entry, heuristics))
            .collect();

        debug!(
            received = stats.received,
            admitted = entries.len(),
            hidden = stats.hidden,
            duplicates = stats.duplicates,
            index_keys = index.len(),
            "built chapter catalog"
        );

        Self {
            entries,
            navigable,
            index,
            stats,
        }
    }

    pub fn entries(&self) -> &[ChapterEntry] {
        &self.entries
    }

    pub fn get(&self, position: usize) -> Option<&ChapterEntry> {
        self.entries.get(position)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Position of the entry a key addresses, by normalized form, then file
    /// name, then extensionless file name
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.index.lookup(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index_of(key).is_some()
    }

    /// Entry a key addresses
    pub fn find(&self, key: &str) -> Option<&ChapterEntry> {
        self.index_of(key).and_then(|position| self.get(position))
    }

    /// Content key (id, else href) of the entry at a position
    pub fn key_at(&self, position: usize) -> Option<&str> {
        self.get(position).and_then(ChapterEntry::key)
    }

    /// Whether prev/next may stop at a position
    pub fn is_navigable_at(&self, position: usize) -> bool {
        self.navigable.get(position).copied().unwrap_or(false)
    }

    /// Title to show for the entry at a position, derived from its key when
    /// neither the TOC nor the manifest named it
    pub fn title_at(&self, position: usize) -> Option<String> {
        let entry = self.get(position)?;
        entry
            .title()
            .map(str::to_string)
            .or_else(|| derived_title(entry))
    }

    /// Title to show for any key addressing an entry
    pub fn title_for(&self, key: &str) -> Option<String> {
        self.index_of(key).and_then(|position| self.title_at(position))
    }

    /// One row per entry, for listings and diagnostics
    pub fn summary(&self) -> Vec<CatalogRow> {
        (0..self.len())
            .map(|position| CatalogRow {
                position,
                key: self.key_at(position).unwrap_or_default().to_string(),
                title: self.title_at(position),
                navigable: self.is_navigable_at(position),
            })
            .collect()
    }
}

/// A serializable line of [`Catalog::summary`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRow {
    pub position: usize,
    pub key: String,
    pub title: Option<String>,
    pub navigable: bool,
}

/// Key that identifies an entry for de-duplication: normalized id, else
/// normalized href, else lower-cased title
pub fn unique_key(entry: &ChapterEntry) -> Option<String> {
    key::normalize_opt(entry.id())
        .or_else(|| key::normalize_opt(entry.href()))
        .or_else(|| entry.title().map(|t| t.trim().to_lowercase()))
        .filter(|k| !k.is_empty())
}

fn admit(
    manifest: Vec<ChapterEntry>,
    hints: &TitleHints,
    heuristics: &Heuristics,
) -> (Vec<ChapterEntry>, BuildStats) {
    let mut stats = BuildStats {
        received: manifest.len(),
        ..BuildStats::default()
    };
    let mut seen = HashSet::new();
    let mut admitted: Vec<ChapterEntry> = Vec::with_capacity(manifest.len());

    for mut entry in manifest {
        entry.display_title = resolve_title(&entry, hints);

        if !is_displayable(&entry, heuristics) {
            stats.hidden += 1;
            continue;
        }

        let Some(unique) = unique_key(&entry) else {
            stats.hidden += 1;
            continue;
        };
        if !seen.insert(unique) {
            debug!(key = ?entry.key(), "dropping duplicate chapter");
            stats.duplicates += 1;
            continue;
        }

        entry.position_hint = Some(admitted.len());
        admitted.push(entry);
    }

    (admitted, stats)
}

/// TOC hint for the id or href, else the sanitized manifest title
fn resolve_title(entry: &ChapterEntry, hints: &TitleHints) -> Option<String> {
    [entry.id(), entry.href()]
        .into_iter()
        .flatten()
        .find_map(|key| hints.resolve(key))
        .map(str::to_string)
        .or_else(|| entry.raw_title().and_then(sanitize_title))
}

/// Title built from the file stem of the id or href
fn derived_title(entry: &ChapterEntry) -> Option<String> {
    let normalized = key::normalize_opt(entry.key())?;
    sanitize_title(key::strip_extension(key::file_name(&normalized)))
}

fn is_displayable(entry: &ChapterEntry, heuristics: &Heuristics) -> bool {
    if entry.key().is_none() && entry.title().is_none() {
        return false;
    }

    let title = entry
        .title()
        .map(str::to_string)
        .or_else(|| derived_title(entry));
    let probe = Probe::new(entry.id(), entry.href(), title.as_deref());

    match heuristics.hidden.first_match(&probe) {
        Some(rule) => {
            debug!(
                key = ?entry.key(),
                title = ?title,
                rule = ?rule.note,
                "hiding chapter"
            );
            false
        }
        None => true,
    }
}

/// Whether sequential reading may stop on an entry
pub fn is_navigable(entry: &ChapterEntry, heuristics: &Heuristics) -> bool {
    !heuristics
        .skipped
        .matches(&Probe::new(entry.id(), entry.href(), None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TocEntry;

    fn scenario_manifest() -> Vec<ChapterEntry> {
        vec![
            ChapterEntry::new("cover"),
            ChapterEntry::new("c1")
                .with_href("OEBPS/c1.html")
                .with_title("Chapter_One"),
            ChapterEntry::new("c2").with_href("OEBPS/c2.html"),
        ]
    }

    #[test]
    fn test_cover_is_hidden() {
        let catalog = Catalog::build(scenario_manifest(), &TitleHints::empty());
        let keys: Vec<_> = catalog.entries().iter().filter_map(|e| e.key()).collect();
        assert_eq!(keys, vec!["c1", "c2"]);
        assert_eq!(catalog.stats().hidden, 1);
        assert_eq!(catalog.get(0).unwrap().position_hint, Some(0));
        assert_eq!(catalog.get(1).unwrap().position_hint, Some(1));
    }

    #[test]
    fn test_titles() {
        let catalog = Catalog::build(scenario_manifest(), &TitleHints::empty());
        assert_eq!(catalog.title_for("c1").as_deref(), Some("Chapter One"));
        assert_eq!(catalog.get(1).unwrap().title(), None);
        assert_eq!(catalog.title_for("c2").as_deref(), Some("C2"));
        assert_eq!(catalog.title_for("missing"), None);
    }

    #[test]
    fn test_hint_overrides_raw_title() {
        let hints = TitleHints::build(&[TocEntry {
            id: Some("c1".into()),
            title: Some("The_Beginning".into()),
            ..TocEntry::default()
        }]);
        let manifest = vec![ChapterEntry::new("c1").with_title("c1.xhtml")];
        let catalog = Catalog::build(manifest, &hints);
        assert_eq!(catalog.title_for("c1").as_deref(), Some("The Beginning"));
    }

    #[test]
    fn test_duplicates_first_wins() {
        let manifest = vec![
            ChapterEntry::new("c1").with_title("First"),
            ChapterEntry::new("C1").with_title("Second"),
            ChapterEntry::from_href("./OEBPS/c3.html").with_title("Third"),
            ChapterEntry::from_href("c3.html#part2").with_title("Third again"),
            ChapterEntry::default().with_title("Loose"),
            ChapterEntry::default().with_title("loose "),
        ];
        let catalog = Catalog::build(manifest, &TitleHints::empty());
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.stats().duplicates, 3);
        assert_eq!(catalog.title_at(0).as_deref(), Some("First"));
        assert_eq!(catalog.title_at(1).as_deref(), Some("Third"));
        assert_eq!(catalog.title_at(2).as_deref(), Some("Loose"));
    }

    #[test]
    fn test_empty_entries_are_hidden() {
        let manifest = vec![ChapterEntry::default(), ChapterEntry::new(" ").with_title("")];
        let catalog = Catalog::build(manifest, &TitleHints::empty());
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_non_content_hrefs_are_hidden() {
        let manifest = vec![
            ChapterEntry::from_href("OEBPS/Images/cover.jpg"),
            ChapterEntry::new("pg-header").with_href("header.html").with_title("Header"),
            ChapterEntry::from_href("styles/book.css").with_title("Style"),
            ChapterEntry::new("item1").with_href("wrap0000.html").with_title("Wrapper"),
            ChapterEntry::from_href("coverpage.html").with_title("Front"),
            ChapterEntry::new("ch1").with_title("Chapter 1"),
        ];
        let catalog = Catalog::build(manifest, &TitleHints::empty());
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.key_at(0), Some("ch1"));
    }

    #[test]
    fn test_index_tiers() {
        let manifest = vec![ChapterEntry::new("ch03").with_href("OEBPS/Text/ch03.xhtml")];
        let catalog = Catalog::build(manifest, &TitleHints::empty());

        for key in [
            "ch03",
            "./OEBPS/Text/ch03.xhtml#anchor",
            "text/ch03.xhtml",
            "ch03.xhtml",
            "Text\\ch03.xhtml",
        ] {
            assert_eq!(catalog.index_of(key), Some(0), "lookup of {key}");
        }
        assert_eq!(catalog.index_of("ch04"), None);
        assert_eq!(catalog.index_of(""), None);
    }

    #[test]
    fn test_exact_match_beats_shared_stem() {
        let manifest = vec![
            ChapterEntry::from_href("part1/ch03.xhtml").with_title("Part one"),
            ChapterEntry::new("ch03").with_title("Standalone"),
            ChapterEntry::from_href("part2/ch03.xhtml").with_title("Part two"),
        ];
        let catalog = Catalog::build(manifest, &TitleHints::empty());
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.index_of("ch03"), Some(1));
        assert_eq!(catalog.index_of("part2/ch03.xhtml"), Some(2));
        assert_eq!(catalog.index_of("ch03.xhtml"), Some(0));
    }

    #[test]
    fn test_content_key_addresses_its_own_entry() {
        let manifest = vec![
            ChapterEntry::new("intro")
                .with_href("OEBPS/c1.html")
                .with_title("Introduction"),
            ChapterEntry::from_href("c1.html").with_title("Chapter 1"),
        ];
        let catalog = Catalog::build(manifest, &TitleHints::empty());
        assert_eq!(catalog.len(), 2);
        for position in 0..catalog.len() {
            let key = catalog.key_at(position).unwrap();
            assert_eq!(catalog.index_of(key), Some(position));
        }
        assert_eq!(catalog.index_of("intro"), Some(0));
    }

    #[test]
    fn test_navigable_flags() {
        let manifest = vec![
            ChapterEntry::new("titlepage-cover").with_title("Frontispiece"),
            ChapterEntry::new("toc01").with_title("Chapters"),
            ChapterEntry::new("c1").with_title("Chapter 1"),
        ];
        let catalog = Catalog::build(manifest, &TitleHints::empty());
        assert_eq!(catalog.len(), 3);
        assert!(!catalog.is_navigable_at(0));
        assert!(!catalog.is_navigable_at(1));
        assert!(catalog.is_navigable_at(2));
        assert!(!catalog.is_navigable_at(3));
    }
}
