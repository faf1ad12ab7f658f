//! Initial command implementation

use super::input::Book;
use anyhow::{bail, Result};
use pagewise_core::cursor::select_initial_with;
use std::path::Path;

/// Show the chapter a reader would open first
pub fn initial(
    manifest: &Path,
    toc: Option<&Path>,
    resume: Option<&str>,
    rules: Option<&Path>,
) -> Result<()> {
    let book = Book::load(manifest, toc, rules)?;

    if let Some(key) = resume {
        if !book.catalog.contains(key) {
            tracing::warn!(key, "resume key not in catalog, ignoring");
        }
    }

    let Some(key) = select_initial_with(
        &book.catalog,
        book.hints.default_chapter_key(),
        resume,
        &book.heuristics,
    ) else {
        bail!("No chapters available in {}", manifest.display());
    };

    println!("{}", key);
    if let Some(title) = book.catalog.title_for(&key) {
        println!("Title: {}", title);
    }

    Ok(())
}
