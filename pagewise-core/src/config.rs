//! Reader configuration

use crate::error::ConfigError;
use crate::rules::Heuristics;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Autosave period for the scroll position
pub const DEFAULT_AUTOSAVE_MS: u64 = 2_000;

/// Chapter reference sent to the bookmark service when none is known
pub const DEFAULT_FALLBACK_CHAPTER: &str = "start";

/// Scroll-offset and bookmark settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProgressConfig {
    /// Milliseconds between scroll-offset saves while reading
    pub autosave_interval_ms: u64,

    /// Substituted for an empty chapter key when saving a bookmark
    pub fallback_chapter_key: String,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            autosave_interval_ms: DEFAULT_AUTOSAVE_MS,
            fallback_chapter_key: DEFAULT_FALLBACK_CHAPTER.to_string(),
        }
    }
}

impl ProgressConfig {
    pub fn autosave_interval(&self) -> Duration {
        Duration::from_millis(self.autosave_interval_ms)
    }
}

/// Everything a reading session can be tuned with
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReaderConfig {
    pub heuristics: Heuristics,
    pub progress: ProgressConfig,
}

impl ReaderConfig {
    /// Load from `PAGEWISE_*` environment variables, falling back to
    /// defaults for anything unset
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using an arbitrary variable source.
    ///
    /// Recognised variables: `PAGEWISE_AUTOSAVE_MS`,
    /// `PAGEWISE_FALLBACK_CHAPTER`, `PAGEWISE_RULES` (path to a JSON rules
    /// file).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("PAGEWISE_AUTOSAVE_MS") {
            config.progress.autosave_interval_ms = value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    name: "PAGEWISE_AUTOSAVE_MS".to_string(),
                    value: value.clone(),
                })?;
        }

        if let Some(value) = lookup("PAGEWISE_FALLBACK_CHAPTER") {
            let value = value.trim();
            if value.is_empty() {
                return Err(ConfigError::Invalid {
                    name: "PAGEWISE_FALLBACK_CHAPTER".to_string(),
                    value: value.to_string(),
                });
            }
            config.progress.fallback_chapter_key = value.to_string();
        }

        if let Some(path) = lookup("PAGEWISE_RULES") {
            config.heuristics = Heuristics::load(Path::new(path.trim()))?;
        }

        Ok(config)
    }
}
