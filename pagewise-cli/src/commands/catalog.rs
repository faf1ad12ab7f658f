//! Catalog command implementation

use super::input::Book;
use anyhow::Result;
use pagewise_core::{BuildStats, CatalogRow};
use serde::Serialize;
use std::path::Path;

/// Catalog output
#[derive(Serialize)]
struct CatalogReport {
    default_key: Option<String>,
    stats: BuildStats,
    chapters: Vec<CatalogRow>,
}

/// Build and list the chapter catalog
pub fn catalog(
    manifest: &Path,
    toc: Option<&Path>,
    rules: Option<&Path>,
    json: bool,
) -> Result<()> {
    let book = Book::load(manifest, toc, rules)?;

    let report = CatalogReport {
        default_key: book.hints.default_chapter_key().map(str::to_string),
        stats: book.catalog.stats(),
        chapters: book.catalog.summary(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for row in &report.chapters {
        println!(
            "{:>4}  {:<32} {:<4} {}",
            row.position,
            row.key,
            if row.navigable { "nav" } else { "skip" },
            row.title.as_deref().unwrap_or("-")
        );
    }
    println!(
        "Chapters:    {} ({} received, {} hidden, {} duplicates)",
        report.chapters.len(),
        report.stats.received,
        report.stats.hidden,
        report.stats.duplicates
    );
    if let Some(key) = &report.default_key {
        println!("TOC default: {}", key);
    }

    Ok(())
}
