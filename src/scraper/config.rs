use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the browser-based post scraper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Page load timeout in seconds (default: 30)
    pub timeout_secs: u64,

    /// Wait time after page load for dynamic content in milliseconds (default: 2000)
    pub wait_after_load_ms: u64,

    /// Number of scroll-to-bottom passes after each reload (default: 1, 0 disables)
    pub scroll_passes: u32,

    /// Wait time after each scroll pass in milliseconds (default: 1500)
    pub scroll_wait_ms: u64,

    /// Host the monitored page must stay on; a page elsewhere is recreated
    pub site_host: String,

    /// Base URL used to absolutize relative permalinks
    pub base_url: String,

    /// Selector matching one element per post
    pub post_selector: String,

    /// Selector for the author name, relative to a post
    pub author_selector: String,

    /// Selector for candidate text blocks, relative to a post; the first
    /// non-empty one that is not the author or a bare date is the content
    pub content_selector: String,

    /// Selector for the permalink anchor whose text is the relative time label
    pub permalink_selector: String,

    /// Path segment preceding the post id in a permalink
    pub permalink_marker: String,

    /// User agent string to use
    pub user_agent: Option<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            headless: true,
            timeout_secs: 30,
            wait_after_load_ms: 2000,
            scroll_passes: 1,
            scroll_wait_ms: 1500,
            site_host: "facebook.com".to_string(),
            base_url: "https://www.facebook.com".to_string(),
            post_selector: "div[role=\"article\"]".to_string(),
            author_selector: "h3 a[role=\"link\"] strong span".to_string(),
            content_selector: "div[dir=\"auto\"]".to_string(),
            permalink_selector: "a[aria-label][href*=\"/posts/\"]".to_string(),
            permalink_marker: "/posts/".to_string(),
            user_agent: Some(
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
            ),
        }
    }
}

impl ScraperConfig {
    /// Get the page load timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the wait time after load as a Duration
    pub fn wait_after_load(&self) -> Duration {
        Duration::from_millis(self.wait_after_load_ms)
    }

    pub fn scroll_wait(&self) -> Duration {
        Duration::from_millis(self.scroll_wait_ms)
    }
}
