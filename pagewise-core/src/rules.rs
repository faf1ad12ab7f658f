//! Heuristic rule tables for boilerplate detection
//!
//! Public-domain EPUB conversions ship covers, licence pages, running
//! headers and wrapper documents as ordinary manifest entries. Which of
//! those are hidden, skipped during prev/next, or disqualified as a default
//! chapter is decided by data in [`Heuristics`] rather than by control flow,
//! so new malformed-source patterns can be added from a JSON file.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which part of an entry a rule inspects
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Manifest id
    Id,

    /// Manifest href
    Href,

    /// Either the id or the href
    Key,

    /// Sanitized display title
    Title,
}

/// How a rule compares its pattern against the field value.
///
/// Comparisons are case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Matcher {
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    Equals(String),

    /// A `/`-separated path segment equal to the pattern
    Segment(String),
}

impl Matcher {
    /// Test a lower-cased field value
    pub fn is_match(&self, value: &str) -> bool {
        match self {
            Matcher::Contains(p) => value.contains(p.to_lowercase().as_str()),
            Matcher::StartsWith(p) => value.starts_with(p.to_lowercase().as_str()),
            Matcher::EndsWith(p) => value.ends_with(p.to_lowercase().as_str()),
            Matcher::Equals(p) => value == p.to_lowercase(),
            Matcher::Segment(p) => {
                let p = p.to_lowercase();
                value.split('/').any(|segment| segment == p)
            }
        }
    }
}

/// A single exclusion rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rule {
    pub field: Field,

    #[serde(rename = "match")]
    pub matcher: Matcher,

    /// Free-form reason shown in diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Rule {
    pub fn new(field: Field, matcher: Matcher) -> Self {
        Self {
            field,
            matcher,
            note: None,
        }
    }

    pub fn contains(field: Field, pattern: &str) -> Self {
        Self::new(field, Matcher::Contains(pattern.to_string()))
    }

    pub fn starts_with(field: Field, pattern: &str) -> Self {
        Self::new(field, Matcher::StartsWith(pattern.to_string()))
    }

    pub fn ends_with(field: Field, pattern: &str) -> Self {
        Self::new(field, Matcher::EndsWith(pattern.to_string()))
    }

    pub fn equals(field: Field, pattern: &str) -> Self {
        Self::new(field, Matcher::Equals(pattern.to_string()))
    }

    pub fn segment(field: Field, pattern: &str) -> Self {
        Self::new(field, Matcher::Segment(pattern.to_string()))
    }

    /// Attach a diagnostic note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Evaluate against a probe. Absent fields never match.
    pub fn matches(&self, probe: &Probe) -> bool {
        let test = |value: &Option<String>| {
            value
                .as_deref()
                .map(|v| self.matcher.is_match(v))
                .unwrap_or(false)
        };

        match self.field {
            Field::Id => test(&probe.id),
            Field::Href => test(&probe.href),
            Field::Key => test(&probe.id) || test(&probe.href),
            Field::Title => test(&probe.title),
        }
    }
}

/// Lower-cased, trimmed view of an entry that rules are evaluated against
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Probe {
    pub id: Option<String>,
    pub href: Option<String>,
    pub title: Option<String>,
}

impl Probe {
    pub fn new(id: Option<&str>, href: Option<&str>, title: Option<&str>) -> Self {
        fn prepare(value: Option<&str>) -> Option<String> {
            value
                .map(|v| v.trim().to_lowercase())
                .filter(|v| !v.is_empty())
        }

        Self {
            id: prepare(id),
            href: prepare(href),
            title: prepare(title),
        }
    }

    /// Probe carrying only a title
    pub fn title(title: &str) -> Self {
        Self::new(None, None, Some(title))
    }
}

/// An ordered list of rules; an entry is excluded when any rule matches
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Append a rule
    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// First rule matching the probe
    pub fn first_match(&self, probe: &Probe) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.matches(probe))
    }

    pub fn matches(&self, probe: &Probe) -> bool {
        self.first_match(probe).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// The three rule tables consulted while building and walking a catalog.
///
/// Tuned for public-domain EPUB conversions; other corpora may need their
/// own tables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Heuristics {
    /// Entries matching are left out of the catalog entirely
    pub hidden: RuleSet,

    /// Entries matching stay listed but are skipped by prev/next
    pub skipped: RuleSet,

    /// Titles matching are never picked as the default chapter
    pub non_content_titles: RuleSet,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            hidden: Self::default_hidden(),
            skipped: Self::default_skipped(),
            non_content_titles: Self::default_non_content_titles(),
        }
    }
}

impl Heuristics {
    /// Parse a rules document; sets missing from it keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a rules document from disk
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    fn default_hidden() -> RuleSet {
        RuleSet::new(vec![
            Rule::starts_with(Field::Title, "cover").with_note("cover page"),
            Rule::contains(Field::Title, "project gutenberg").with_note("licence boilerplate"),
            Rule::starts_with(Field::Title, "table of contents").with_note("toc page"),
            Rule::equals(Field::Title, "toc").with_note("toc page"),
            Rule::contains(Field::Key, "pg-header").with_note("running header"),
            Rule::contains(Field::Key, "pg-footer").with_note("running footer"),
            Rule::contains(Field::Key, "coverpage").with_note("cover page"),
            Rule::segment(Field::Href, "images").with_note("image resource"),
            Rule::ends_with(Field::Href, ".css").with_note("stylesheet"),
            Rule::contains(Field::Key, "wrap0000").with_note("wrapper document"),
        ])
    }

    fn default_skipped() -> RuleSet {
        RuleSet::new(vec![
            Rule::contains(Field::Id, "cover"),
            Rule::contains(Field::Href, "wrap0000"),
            Rule::starts_with(Field::Id, "toc"),
            Rule::contains(Field::Href, "toc"),
            Rule::contains(Field::Id, "pg-header"),
            Rule::contains(Field::Id, "pg-footer"),
        ])
    }

    fn default_non_content_titles() -> RuleSet {
        RuleSet::new(vec![
            Rule::contains(Field::Title, "cover"),
            Rule::contains(Field::Title, "project gutenberg"),
            Rule::contains(Field::Title, "license"),
            Rule::contains(Field::Title, "table of contents"),
            Rule::equals(Field::Title, "contents"),
            Rule::equals(Field::Title, "toc"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matchers_are_case_insensitive() {
        assert!(Matcher::Contains("PG-Header".into()).is_match("x-pg-header-1"));
        assert!(Matcher::StartsWith("Cover".into()).is_match("cover art"));
        assert!(Matcher::EndsWith(".CSS".into()).is_match("style.css"));
        assert!(Matcher::Equals("toc".into()).is_match("toc"));
        assert!(!Matcher::Equals("toc".into()).is_match("tocs"));
    }

    #[test]
    fn test_segment_matcher() {
        let m = Matcher::Segment("images".into());
        assert!(m.is_match("oebps/images/cover.jpg"));
        assert!(m.is_match("images/cover.jpg"));
        assert!(!m.is_match("oebps/imagesets/a.jpg"));
    }

    #[test]
    fn test_key_field_checks_id_and_href() {
        let rule = Rule::contains(Field::Key, "pg-header");
        assert!(rule.matches(&Probe::new(Some("pg-header"), None, None)));
        assert!(rule.matches(&Probe::new(None, Some("x/pg-header.html"), None)));
        assert!(!rule.matches(&Probe::new(Some("c1"), Some("c1.html"), None)));
    }

    #[test]
    fn test_default_hidden_rules() {
        let h = Heuristics::default();
        assert!(h.hidden.matches(&Probe::new(None, Some("OEBPS/Images/cover.jpg"), None)));
        assert!(h.hidden.matches(&Probe::new(None, Some("styles/main.css"), None)));
        assert!(h.hidden.matches(&Probe::title("Cover")));
        assert!(h.hidden.matches(&Probe::title("The Project Gutenberg eBook")));
        assert!(!h.hidden.matches(&Probe::new(Some("c1"), Some("c1.html"), Some("Chapter 1"))));
    }

    #[test]
    fn test_partial_rules_file_keeps_defaults() {
        let json = r#"{
            "hidden": [
                { "field": "title", "match": { "equals": "colophon" } }
            ]
        }"#;
        let h = Heuristics::from_json(json).unwrap();
        assert_eq!(h.hidden.len(), 1);
        assert!(h.hidden.matches(&Probe::title("Colophon")));
        assert_eq!(h.skipped, Heuristics::default().skipped);
    }

    #[test]
    fn test_first_match_reports_note() {
        let h = Heuristics::default();
        let rule = h
            .hidden
            .first_match(&Probe::new(None, Some("x.css"), None))
            .unwrap();
        assert_eq!(rule.note.as_deref(), Some("stylesheet"));
    }
}
