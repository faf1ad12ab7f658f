//! Chapter content returned by the EPUB content service

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

/// Rendered HTML for one chapter
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChapterContent {
    /// Key the service resolved the request to
    #[serde(default)]
    pub chapter_key: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub html_content: String,
}

impl ChapterContent {
    pub fn new(chapter_key: impl Into<String>, html_content: impl Into<String>) -> Self {
        Self {
            chapter_key: chapter_key.into(),
            title: None,
            html_content: html_content.into(),
        }
    }

    /// Set the service-provided title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Service title, else the text of the first `h1`-`h3` in the body
    pub fn effective_title(&self) -> Option<String> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .or_else(|| first_heading(&self.html_content))
    }
}

fn first_heading(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("h1, h2, h3").ok()?;

    document.select(&selector).find_map(|heading| {
        let text = heading
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_title_wins() {
        let content = ChapterContent::new("c1", "<h1>Heading</h1>").with_title("Chapter One");
        assert_eq!(content.effective_title().as_deref(), Some("Chapter One"));
    }

    #[test]
    fn test_heading_fallback() {
        let html = r#"
            <html><body>
                <h2>  Down the <em>Rabbit</em>-Hole </h2>
                <p>Alice was beginning to get very tired.</p>
            </body></html>
        "#;
        let content = ChapterContent::new("c1", html).with_title("  ");
        assert_eq!(
            content.effective_title().as_deref(),
            Some("Down the Rabbit-Hole")
        );
    }

    #[test]
    fn test_no_heading() {
        let content = ChapterContent::new("c1", "<p>Just text</p>");
        assert_eq!(content.effective_title(), None);
    }
}
