//! Loading manifest, TOC and rule dumps

use anyhow::{Context, Result};
use pagewise_core::config::ReaderConfig;
use pagewise_core::types::{ChapterEntry, ChapterManifest, EpubMetadata, TocEntry};
use pagewise_core::{Catalog, Heuristics, TitleHints};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;

/// A manifest dump: the service response or just its chapter array
#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestFile {
    Bare(Vec<ChapterEntry>),
    Response(ChapterManifest),
}

/// A TOC dump: the metadata response or just its entry array
#[derive(Deserialize)]
#[serde(untagged)]
enum TocFile {
    Bare(Vec<TocEntry>),
    Response(EpubMetadata),
}

/// Everything the navigation commands work from
pub struct Book {
    pub heuristics: Heuristics,
    pub hints: TitleHints,
    pub catalog: Catalog,
}

impl Book {
    /// Load the dumps and build hints and catalog
    pub fn load(manifest: &Path, toc: Option<&Path>, rules: Option<&Path>) -> Result<Self> {
        let heuristics = load_heuristics(rules)?;
        let hints = match toc {
            Some(path) => TitleHints::build_with(&load_toc(path)?, &heuristics),
            None => TitleHints::empty(),
        };
        let catalog = Catalog::build_with(load_manifest(manifest)?, &hints, &heuristics);

        Ok(Self {
            heuristics,
            hints,
            catalog,
        })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to open {} file: {}", what, path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse {} file: {}", what, path.display()))
}

pub fn load_manifest(path: &Path) -> Result<Vec<ChapterEntry>> {
    Ok(match read_json(path, "manifest")? {
        ManifestFile::Bare(chapters) => chapters,
        ManifestFile::Response(manifest) => manifest.chapters,
    })
}

pub fn load_toc(path: &Path) -> Result<Vec<TocEntry>> {
    Ok(match read_json(path, "toc")? {
        TocFile::Bare(entries) => entries,
        TocFile::Response(metadata) => metadata.toc_entries,
    })
}

/// Rules from `--rules`, else from `PAGEWISE_RULES`, else the built-in set
pub fn load_heuristics(path: Option<&Path>) -> Result<Heuristics> {
    match path {
        Some(path) => Heuristics::load(path)
            .with_context(|| format!("Failed to load rules file: {}", path.display())),
        None => Ok(ReaderConfig::from_env()
            .context("Invalid PAGEWISE_* environment")?
            .heuristics),
    }
}
