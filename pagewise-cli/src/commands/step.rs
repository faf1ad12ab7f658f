//! Step command implementation

use super::input::Book;
use anyhow::Result;
use pagewise_core::cursor::{self, Direction};
use std::path::Path;

/// Show the neighbouring navigable chapter
pub fn step(
    manifest: &Path,
    from: &str,
    back: bool,
    toc: Option<&Path>,
    rules: Option<&Path>,
) -> Result<()> {
    let book = Book::load(manifest, toc, rules)?;
    let direction = if back {
        Direction::Backward
    } else {
        Direction::Forward
    };

    if !book.catalog.contains(from) {
        tracing::warn!(key = from, "chapter not in catalog, stepping from outside");
    }

    match cursor::step(&book.catalog, Some(from), direction) {
        Some(key) => println!("{}", key),
        None if back => println!("(start of book)"),
        None => println!("(end of book)"),
    }

    Ok(())
}
