use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use chrono::Utc;
use futures::StreamExt;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use crate::app::{PostwatchError, Result};
use crate::domain::RawPost;
use crate::scraper::config::ScraperConfig;
use crate::scraper::extractor::PostExtractor;
use crate::scraper::PostScraper;

/// The page kept open between ticks and the target it was opened for
struct TrackedPage {
    target: String,
    page: Page,
}

/// Chrome-based post scraper using chromiumoxide.
///
/// Keeps one page open on the monitored target and reloads it on every
/// scrape, recreating it when it drifted away from the configured host.
pub struct ChromeScraper {
    browser: Browser,
    config: ScraperConfig,
    extractor: PostExtractor,
    tracked: Mutex<Option<TrackedPage>>,
}

impl ChromeScraper {
    /// Create a new Chrome scraper with the given configuration
    pub async fn new(config: ScraperConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer");

        if !config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| PostwatchError::Scraper(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            PostwatchError::Scraper(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
        });

        let extractor = PostExtractor::new(config.clone());

        Ok(Self {
            browser,
            config,
            extractor,
            tracked: Mutex::new(None),
        })
    }

    /// Reload the tracked page, or open a fresh one if it is unusable.
    ///
    /// The page stays in `tracked` across every await, so a timeout
    /// cancelling this future never loses track of an open tab.
    async fn refresh_page(&self, target: &str) -> Result<Page> {
        let mut tracked = self.tracked.lock().await;

        if let Some(current) = &*tracked {
            let url = current.page.url().await.ok().flatten();
            if is_reusable(&current.target, url.as_deref(), target, &self.config.site_host) {
                debug!("Reloading tracked page");
                current
                    .page
                    .reload()
                    .await
                    .map_err(|e| PostwatchError::Scraper(format!("Reload failed: {}", e)))?;
                return Ok(current.page.clone());
            }
        }

        if let Some(stale) = &*tracked {
            info!("Tracked page is stale, opening a new one");
            let _ = stale.page.clone().close().await;
            *tracked = None;
        }

        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| PostwatchError::Scraper(format!("Failed to create page: {}", e)))?;
        *tracked = Some(TrackedPage {
            target: target.to_string(),
            page: page.clone(),
        });

        if let Some(ref ua) = self.config.user_agent {
            page.set_user_agent(ua)
                .await
                .map_err(|e| PostwatchError::Scraper(format!("Failed to set user agent: {}", e)))?;
        }

        // A page left on about:blank by a failed navigation is replaced next time
        page.goto(target)
            .await
            .map_err(|e| PostwatchError::Scraper(format!("Navigation failed: {}", e)))?;

        info!("Opened tracking page for {}", target);
        Ok(page)
    }

    async fn scroll_to_bottom(&self, page: &Page) -> Result<()> {
        for _ in 0..self.config.scroll_passes {
            page.evaluate(self.extractor.scroll_script())
                .await
                .map_err(|e| PostwatchError::Scraper(format!("Scroll failed: {}", e)))?;
            tokio::time::sleep(self.config.scroll_wait()).await;
        }
        Ok(())
    }

    async fn scrape_inner(&self, target: &str) -> Result<Vec<RawPost>> {
        let page = self.refresh_page(target).await?;

        page.wait_for_navigation()
            .await
            .map_err(|e| PostwatchError::Scraper(format!("Navigation failed: {}", e)))?;

        // Additional wait for dynamic content
        tokio::time::sleep(self.config.wait_after_load()).await;

        self.scroll_to_bottom(&page).await?;

        let script = self.extractor.extraction_script();
        let result: serde_json::Value = page
            .evaluate(script)
            .await
            .map_err(|e| PostwatchError::Scraper(format!("Script execution failed: {}", e)))?
            .into_value()
            .map_err(|e| PostwatchError::Scraper(format!("Failed to parse result: {:?}", e)))?;

        let posts = self.extractor.parse_records(&result, Utc::now());
        debug!("Extracted {} posts from {}", posts.len(), target);
        Ok(posts)
    }
}

#[async_trait]
impl PostScraper for ChromeScraper {
    async fn scrape(&self, target: &str) -> Result<Vec<RawPost>> {
        tokio::time::timeout(self.config.timeout(), self.scrape_inner(target))
            .await
            .map_err(|_| {
                PostwatchError::Scraper(format!(
                    "Scrape timed out after {}s",
                    self.config.timeout_secs
                ))
            })?
    }
}

/// A tracked page is reloaded in place only while it belongs to the same
/// target and is still on the monitored site
fn is_reusable(tracked_target: &str, page_url: Option<&str>, target: &str, site_host: &str) -> bool {
    tracked_target == target
        && page_url
            .and_then(|url| Url::parse(url).ok())
            .and_then(|url| url.host_str().map(|h| host_matches(h, site_host)))
            .unwrap_or(false)
}

/// `www.facebook.com` matches `facebook.com`; `notfacebook.com` does not
pub(crate) fn host_matches(host: &str, site_host: &str) -> bool {
    host == site_host || host.ends_with(&format!(".{}", site_host))
}
