//! Cross-device "last chapter read" bookmark

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A (user, book) bookmark record as stored by the bookmark service
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    #[serde(default)]
    pub page: u32,

    #[serde(default)]
    pub chapter_key: Option<String>,

    /// Last write time, when the service reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Bookmark {
    pub fn new(chapter_key: impl Into<String>) -> Self {
        Self {
            chapter_key: Some(chapter_key.into()),
            ..Self::default()
        }
    }

    /// Set the page number
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Chapter to resume, if the record names one
    pub fn resume_key(&self) -> Option<&str> {
        self.chapter_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}
