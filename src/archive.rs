//! # Thread Archive Module
//!
//! The data model shared by the scraper and the chat side, plus the
//! persistence writer that turns a finished scrape into files on disk.
//!
//! ## Key Components
//!
//! - `Post`: One extracted forum post. Every metadata field is optional because
//!   extraction is best-effort per field.
//! - `ThreadArchive`: The thread URL, the time of the scrape and all posts in
//!   page order.
//! - `write_archive` / `read_archive`: JSON encoding (indented, UTF-8, non-ASCII
//!   kept verbatim) plus a plain-text mirror for quick reading.
//!
//! Each run overwrites both files. There is no merge or update path.

mod error;
mod writer;

pub use error::ArchiveError;
pub use writer::{read_archive, render_text, write_archive, write_json, write_text};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A single post extracted from a thread page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Post number shown by the forum, without the leading `#`
    pub post_number: Option<String>,

    /// Display name of the author
    pub username: Option<String>,

    /// Machine-readable timestamp taken from the post's `<time>` element
    pub date: Option<String>,

    /// Plain-text body, one line per text block
    pub content: String,
}

/// Everything a scrape run produced, as persisted to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadArchive {
    /// URL of the first page of the thread
    pub thread_url: String,

    /// When the scrape finished. Timestamps without an offset are read as UTC.
    #[serde(deserialize_with = "deserialize_scrape_date")]
    pub scrape_date: DateTime<Utc>,

    /// Posts in the order they appeared across pages
    pub posts: Vec<Post>,
}

fn deserialize_scrape_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(date) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(date.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("invalid scrape_date {:?}: {}", raw, e)))
}

impl ThreadArchive {
    /// Create an archive stamped with the current time
    pub fn new(thread_url: impl Into<String>, posts: Vec<Post>) -> Self {
        Self {
            thread_url: thread_url.into(),
            scrape_date: Utc::now(),
            posts,
        }
    }

    /// Look up a post by its forum post number
    pub fn post_by_number(&self, number: &str) -> Option<&Post> {
        self.posts
            .iter()
            .find(|post| post.post_number.as_deref() == Some(number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(number: &str, username: &str) -> Post {
        Post {
            post_number: Some(number.to_string()),
            username: Some(username.to_string()),
            date: Some("2016-03-01T10:00:00+0000".to_string()),
            content: format!("body of {}", number),
        }
    }

    #[test]
    fn test_post_serializes_missing_fields_as_null() {
        let post = Post {
            post_number: None,
            username: None,
            date: None,
            content: "orphan".to_string(),
        };

        let value = serde_json::to_value(&post).unwrap();
        assert!(value["post_number"].is_null());
        assert!(value["username"].is_null());
        assert!(value["date"].is_null());
        assert_eq!(value["content"], "orphan");
    }

    #[test]
    fn test_archive_field_names() {
        let archive = ThreadArchive::new("https://forum.example/threads/t.1/", vec![post("1", "a")]);
        let value = serde_json::to_value(&archive).unwrap();

        assert_eq!(value["thread_url"], "https://forum.example/threads/t.1/");
        assert!(value["scrape_date"].is_string());
        assert_eq!(value["posts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_scrape_date_without_offset_is_utc() {
        let json = r#"{"thread_url":"https://forum.example/threads/t.1/","scrape_date":"2024-12-01T10:15:30.123456","posts":[]}"#;
        let archive: ThreadArchive = serde_json::from_str(json).unwrap();

        assert_eq!(
            archive.scrape_date.to_rfc3339(),
            "2024-12-01T10:15:30.123456+00:00"
        );
    }

    #[test]
    fn test_scrape_date_with_offset() {
        let json = r#"{"thread_url":"u","scrape_date":"2024-12-01T12:15:30+02:00","posts":[]}"#;
        let archive: ThreadArchive = serde_json::from_str(json).unwrap();
        assert_eq!(archive.scrape_date.to_rfc3339(), "2024-12-01T10:15:30+00:00");

        let bad = r#"{"thread_url":"u","scrape_date":"yesterday","posts":[]}"#;
        assert!(serde_json::from_str::<ThreadArchive>(bad).is_err());
    }

    #[test]
    fn test_post_by_number() {
        let archive = ThreadArchive::new(
            "https://forum.example/threads/t.1/",
            vec![post("1", "alice"), post("2", "bob")],
        );

        assert_eq!(
            archive.post_by_number("2").and_then(|p| p.username.as_deref()),
            Some("bob")
        );
        assert!(archive.post_by_number("3").is_none());
    }
}
