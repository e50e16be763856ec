//! Browser-based scraping of the monitored page.
//!
//! # Architecture
//!
//! ```text
//! Tracked page → reload → scroll → extraction script → Vec<RawPost>
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use postwatch::scraper::{ChromeScraper, PostScraper, ScraperConfig};
//!
//! let scraper = ChromeScraper::new(ScraperConfig::default()).await?;
//! let posts = scraper.scrape("https://www.facebook.com/groups/example").await?;
//! ```

mod chrome;
mod config;
mod extractor;

pub use chrome::ChromeScraper;
pub use config::ScraperConfig;
pub use extractor::{label_to_timestamp, PostExtractor};

pub(crate) use chrome::host_matches;

use crate::app::Result;
use crate::domain::RawPost;
use async_trait::async_trait;

/// Source of freshly rendered posts
#[async_trait]
pub trait PostScraper: Send + Sync {
    /// Refresh `target` and return the posts currently rendered, front of
    /// feed first. An empty list is not an error.
    async fn scrape(&self, target: &str) -> Result<Vec<RawPost>>;
}
