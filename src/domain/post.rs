use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A single post as scraped from the monitored page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPost {
    pub id: String,
    pub author: String,
    pub content: String,
    pub link: String,
    /// Relative time label as rendered by the page ("5m", "3h", "2d").
    pub recency_label: String,
    /// Epoch milliseconds, when the label could be turned into one.
    pub timestamp: Option<i64>,
}

impl RawPost {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            author: String::new(),
            content: String::new(),
            link: String::new(),
            recency_label: String::new(),
            timestamp: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.recency_label = label.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Fallback id for posts without a parseable permalink.
    ///
    /// Returns an empty string when there is nothing to hash, so two
    /// posts with neither link nor content share the empty id.
    pub fn content_hash_id(author: &str, content: &str) -> String {
        if content.is_empty() {
            return String::new();
        }
        let mut hasher = Sha256::new();
        hasher.update(author.as_bytes());
        hasher.update([0u8]);
        hasher.update(content.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn display_author(&self) -> &str {
        if self.author.is_empty() {
            "Unknown"
        } else {
            &self.author
        }
    }

    /// Plain text body handed to the delivery channel.
    pub fn message_text(&self) -> String {
        let mut text = String::from(self.display_author());
        if !self.content.is_empty() {
            text.push_str("\n\n");
            text.push_str(&self.content);
        }
        if !self.link.is_empty() {
            text.push_str("\n\n");
            text.push_str(&self.link);
        }
        text
    }
}
