//! Property tests for key normalization and catalog navigation

use pagewise_core::catalog::{unique_key, Catalog};
use pagewise_core::cursor::{select_initial, step, Direction};
use pagewise_core::key;
use pagewise_core::title::TitleHints;
use pagewise_core::types::ChapterEntry;
use proptest::prelude::*;
use std::collections::HashSet;

const IDS: &[&str] = &[
    "cover", "c1", "c2", "c3", "toc", "pg-header-1", "wrap0000", "intro", "notes", "C1",
];

const HREFS: &[&str] = &[
    "OEBPS/c1.html",
    "Text/c2.xhtml",
    "./c3.html",
    "images/plate.png",
    "style.css",
    "toc.xhtml",
    "OEBPS/Text/notes.xhtml#n1",
    "/oebps/intro.xhtml",
];

const TITLES: &[&str] = &[
    "Chapter_One",
    "Cover",
    "Contents",
    "Project Gutenberg License",
    "0001",
    "",
    "Notes",
];

fn entry_strategy() -> impl Strategy<Value = ChapterEntry> {
    (
        prop::option::of(prop::sample::select(IDS)),
        prop::option::of(prop::sample::select(HREFS)),
        prop::option::of(prop::sample::select(TITLES)),
    )
        .prop_map(|(id, href, title)| ChapterEntry {
            id: id.map(str::to_string),
            href: href.map(str::to_string),
            raw_title: title.map(str::to_string),
            ..ChapterEntry::default()
        })
}

fn manifest_strategy() -> impl Strategy<Value = Vec<ChapterEntry>> {
    prop::collection::vec(entry_strategy(), 0..16)
}

proptest! {
    #[test]
    fn normalize_is_idempotent(raw in "[ ./#\\\\a-zA-Z0-9_-]{0,40}") {
        let once = key::normalize(&raw);
        let twice = once.as_deref().and_then(key::normalize);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn normalize_strips_known_prefixes(name in "[a-z0-9_]{1,12}\\.x?html") {
        let expected = Some(name.clone());
        prop_assert_eq!(key::normalize(&format!("./OEBPS/{}", name)), expected.clone());
        prop_assert_eq!(key::normalize(&format!("/oebps/{}#frag", name)), expected.clone());
        prop_assert_eq!(key::normalize(&format!("  {}  ", name.to_uppercase())), expected);
    }

    #[test]
    fn catalog_keys_are_unique(manifest in manifest_strategy()) {
        let catalog = Catalog::build(manifest, &TitleHints::empty());
        let mut seen = HashSet::new();
        for entry in catalog.entries() {
            let unique = unique_key(entry);
            prop_assert!(unique.is_some());
            prop_assert!(seen.insert(unique));
        }
        let stats = catalog.stats();
        prop_assert_eq!(stats.received, catalog.len() + stats.hidden + stats.duplicates);
    }

    #[test]
    fn boilerplate_markers_never_admitted(manifest in manifest_strategy()) {
        let catalog = Catalog::build(manifest, &TitleHints::empty());
        for entry in catalog.entries() {
            let id = entry.id().unwrap_or_default().to_lowercase();
            let href = entry.href().unwrap_or_default().to_lowercase();
            prop_assert!(!id.contains("pg-header"));
            prop_assert!(!id.contains("wrap0000") && !href.contains("wrap0000"));
            prop_assert!(!href.ends_with(".css"));
            prop_assert!(!href.starts_with("images/"));
        }
    }

    #[test]
    fn every_key_resolves_to_its_own_position(manifest in manifest_strategy()) {
        let catalog = Catalog::build(manifest, &TitleHints::empty());
        for position in 0..catalog.len() {
            if let Some(key) = catalog.key_at(position) {
                prop_assert_eq!(catalog.index_of(key), Some(position));
            }
        }
    }

    #[test]
    fn decorated_href_resolves_to_its_entry(
        dir in "part[a-z]{0,5}",
        stem in "ch[0-9]{1,4}",
        form in 0usize..3,
        dot_slash in any::<bool>(),
        oebps in any::<bool>(),
        fragment in prop::option::of("[a-z0-9]{1,6}"),
        upper in any::<bool>(),
    ) {
        let href = format!("OEBPS/{}/{}.xhtml", dir, stem);
        let manifest = vec![
            ChapterEntry::from_href(format!("OEBPS/{}/other0.xhtml", dir)).with_title("Chapter"),
            ChapterEntry::from_href(format!("OEBPS/{}/other1.xhtml", dir)).with_title("Chapter"),
            ChapterEntry::from_href(href.clone()).with_title("Chapter"),
        ];
        let catalog = Catalog::build(manifest, &TitleHints::empty());
        prop_assert_eq!(catalog.index_of(&href), Some(2));

        let mut lookup = String::new();
        if dot_slash {
            lookup.push_str("./");
        }
        if oebps {
            lookup.push_str("OEBPS/");
        }
        lookup.push_str(&match form {
            0 => format!("{}/{}.xhtml", dir, stem),
            1 => format!("{}.xhtml", stem),
            _ => stem.clone(),
        });
        if let Some(fragment) = fragment {
            lookup.push('#');
            lookup.push_str(&fragment);
        }
        if upper {
            lookup = lookup.to_uppercase();
        }

        prop_assert_eq!(catalog.index_of(&lookup), Some(2), "lookup of {}", lookup);
    }

    #[test]
    fn step_lands_on_navigable_entries(
        manifest in manifest_strategy(),
        start in 0usize..16,
        forward in any::<bool>(),
    ) {
        let catalog = Catalog::build(manifest, &TitleHints::empty());
        let direction = if forward { Direction::Forward } else { Direction::Backward };
        let from = catalog.key_at(start).map(str::to_string);

        if let Some(next) = step(&catalog, from.as_deref(), direction) {
            let position = catalog.index_of(&next).unwrap();
            prop_assert!(catalog.is_navigable_at(position));
            if let Some(from_position) = from.as_deref().and_then(|k| catalog.index_of(k)) {
                match direction {
                    Direction::Forward => prop_assert!(position > from_position),
                    Direction::Backward => prop_assert!(position < from_position),
                }
            }
        }
    }

    #[test]
    fn stepping_forward_terminates(manifest in manifest_strategy()) {
        let catalog = Catalog::build(manifest, &TitleHints::empty());
        let mut current = select_initial(&catalog, None, None);
        let mut visited = 0;
        while let Some(key) = current {
            visited += 1;
            prop_assert!(visited <= catalog.len() + 1);
            current = step(&catalog, Some(&key), Direction::Forward);
        }
    }

    #[test]
    fn initial_chapter_is_in_catalog(manifest in manifest_strategy()) {
        let catalog = Catalog::build(manifest, &TitleHints::empty());
        match select_initial(&catalog, None, None) {
            Some(key) => prop_assert!(catalog.contains(&key)),
            None => prop_assert!((0..catalog.len()).all(|p| catalog.key_at(p).is_none())),
        }
    }
}
