//! Chapter key normalization
//!
//! The EPUB service addresses the same chapter in several ways: a manifest
//! id (`c1`), a package-relative href (`OEBPS/Text/c1.xhtml`), a link target
//! inside another chapter (`./Text/c1.xhtml#note`), or a bare file name.
//! Everything that compares keys goes through [`normalize`] and the three
//! addressing tiers exposed by [`KeyVariants`].

/// Leading path segments that carry no identity.
const STRIPPED_PREFIXES: [&str; 3] = ["./", "oebps/", "/"];

/// Canonicalize a chapter id or href for comparison.
///
/// Lower-cases, converts `\` to `/`, drops any `#fragment`, then strips
/// leading `./`, `oebps/` and `/` until none remain. Returns `None` when
/// nothing is left.
pub fn normalize(raw: &str) -> Option<String> {
    let mut key = raw.trim().to_lowercase().replace('\\', "/");
    if let Some(pos) = key.find('#') {
        key.truncate(pos);
    }

    let mut rest = key.trim();
    loop {
        let Some(stripped) = STRIPPED_PREFIXES
            .iter()
            .find_map(|prefix| rest.strip_prefix(*prefix))
        else {
            break;
        };
        rest = stripped.trim_start();
    }

    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

/// Normalize an optional key, treating `None` like an empty string.
pub fn normalize_opt(raw: Option<&str>) -> Option<String> {
    raw.and_then(normalize)
}

/// Substring after the last `/`, or the whole path when there is none.
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// Substring before the last `.`.
///
/// A leading dot (`.html`) is not an extension separator, so such names are
/// returned unchanged.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) if pos > 0 => &name[..pos],
        _ => name,
    }
}

/// Whether two raw keys address the same chapter.
///
/// Equal normalized forms, equal file names, or equal extensionless file
/// names all count.
pub fn equivalent(a: &str, b: &str) -> bool {
    match (KeyVariants::of(a), KeyVariants::of(b)) {
        (Some(a), Some(b)) => {
            a.normalized == b.normalized || a.file_name == b.file_name || a.stem == b.stem
        }
        _ => false,
    }
}

/// The three addressing tiers of one raw key, most specific first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyVariants {
    /// Full normalized form
    pub normalized: String,

    /// Last path segment of the normalized form
    pub file_name: String,

    /// File name without its extension
    pub stem: String,
}

impl KeyVariants {
    /// Compute the variants of a raw key, or `None` if it normalizes away.
    pub fn of(raw: &str) -> Option<Self> {
        let normalized = normalize(raw)?;
        let file_name = file_name(&normalized).to_string();
        let stem = strip_extension(&file_name).to_string();
        Some(Self {
            normalized,
            file_name,
            stem,
        })
    }

    /// Non-empty variants in lookup order, without repeats.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let tiers = [
            self.normalized.as_str(),
            self.file_name.as_str(),
            self.stem.as_str(),
        ];
        let mut seen: Vec<&str> = Vec::with_capacity(3);
        tiers.into_iter().filter(move |tier| {
            if tier.is_empty() || seen.contains(tier) {
                false
            } else {
                seen.push(*tier);
                true
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_rules() {
        assert_eq!(normalize("  OEBPS/Text/Ch01.xhtml ").as_deref(), Some("text/ch01.xhtml"));
        assert_eq!(normalize("OEBPS\\Text\\ch01.xhtml").as_deref(), Some("text/ch01.xhtml"));
        assert_eq!(normalize("./OEBPS/ch01.html#p3").as_deref(), Some("ch01.html"));
        assert_eq!(normalize("/ch01.html").as_deref(), Some("ch01.html"));
        assert_eq!(normalize("c1").as_deref(), Some("c1"));
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("   "), None);
        assert_eq!(normalize("#top"), None);
        assert_eq!(normalize("./"), None);
        assert_eq!(normalize_opt(None), None);
    }

    #[test]
    fn test_normalize_repeated_prefixes() {
        assert_eq!(normalize("/./x.html").as_deref(), Some("x.html"));
        assert_eq!(normalize("/OEBPS/x.html").as_deref(), Some("x.html"));
        let once = normalize("a #b").unwrap();
        assert_eq!(normalize(&once).unwrap(), once);
    }

    #[test]
    fn test_file_name_and_extension() {
        assert_eq!(file_name("text/ch03.xhtml"), "ch03.xhtml");
        assert_eq!(file_name("ch03.xhtml"), "ch03.xhtml");
        assert_eq!(strip_extension("ch03.xhtml"), "ch03");
        assert_eq!(strip_extension("archive.tar.gz"), "archive.tar");
        assert_eq!(strip_extension(".html"), ".html");
        assert_eq!(strip_extension("noext"), "noext");
    }

    #[test]
    fn test_equivalent_tiers() {
        assert!(equivalent("./OEBPS/Text/ch03.xhtml#anchor", "text/ch03.xhtml"));
        assert!(equivalent("Text/ch03.xhtml", "ch03.xhtml"));
        assert!(equivalent("./OEBPS/Text/ch03.xhtml#anchor", "ch03"));
        assert!(!equivalent("ch03", "ch04"));
        assert!(!equivalent("", ""));
    }

    #[test]
    fn test_variants_dedup() {
        let variants = KeyVariants::of("c1").unwrap();
        assert_eq!(variants.iter().collect::<Vec<_>>(), vec!["c1"]);

        let variants = KeyVariants::of("OEBPS/Text/c1.xhtml").unwrap();
        assert_eq!(
            variants.iter().collect::<Vec<_>>(),
            vec!["text/c1.xhtml", "c1.xhtml", "c1"]
        );
    }
}
