//! One pass of the scrape → filter → deliver pipeline.
//!
//! ```text
//! scrape → load notified set → DedupFilter → deliver each → save set
//! ```
//!
//! Delivery happens before the updated set is committed: a crash in between
//! re-delivers on the next tick rather than losing posts. A failed delivery
//! still counts as notified and is not retried.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::app::Result;
use crate::config::Config;
use crate::domain::RecencyPolicy;
use crate::filter::{DedupFilter, FilterOutcome};
use crate::notifier::Notifier;
use crate::scraper::PostScraper;
use crate::store::NotifiedStore;

/// Per-tick settings, taken fresh from the configuration every time.
#[derive(Debug, Clone)]
pub struct TickSettings {
    pub target: String,
    pub policy: RecencyPolicy,
}

impl TickSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            target: config.tracker.url.trim().to_string(),
            policy: config.policy.to_policy(),
        }
    }
}

/// Counters describing a finished tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub scraped: usize,
    pub already_notified: usize,
    pub not_recent: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Ids newly written to the store.
    pub committed: usize,
}

impl TickReport {
    pub fn eligible(&self) -> usize {
        self.delivered + self.failed
    }

    pub fn summary(&self) -> String {
        format!(
            "{} scraped, {} new, {} delivered, {} failed ({} already notified, {} not recent)",
            self.scraped,
            self.eligible(),
            self.delivered,
            self.failed,
            self.already_notified,
            self.not_recent
        )
    }
}

pub struct Tracker<S: NotifiedStore + Send + Sync + 'static> {
    scraper: Arc<dyn PostScraper>,
    store: Arc<S>,
    // Serializes ticks so load and save never interleave.
    in_flight: Mutex<()>,
}

impl<S: NotifiedStore + Send + Sync + 'static> Tracker<S> {
    pub fn new(scraper: Arc<dyn PostScraper>, store: Arc<S>) -> Self {
        Self {
            scraper,
            store,
            in_flight: Mutex::new(()),
        }
    }

    /// Scrape and filter without delivering or committing anything.
    pub async fn preview(&self, settings: &TickSettings) -> Result<FilterOutcome> {
        let _guard = self.in_flight.lock().await;

        let posts = self.scraper.scrape(&settings.target).await?;
        let notified = self.store.load_notified_set()?;
        Ok(DedupFilter::filter(&posts, &notified, &settings.policy))
    }

    /// Run one full tick.
    ///
    /// Scrape and storage errors fail the tick without advancing the
    /// notified set. Delivery errors are counted and logged only.
    pub async fn tick(&self, settings: &TickSettings, notifier: &dyn Notifier) -> Result<TickReport> {
        let _guard = self.in_flight.lock().await;

        let posts = self.scraper.scrape(&settings.target).await?;
        let mut report = TickReport {
            scraped: posts.len(),
            ..Default::default()
        };

        if posts.is_empty() {
            info!("No posts found");
            return Ok(report);
        }

        let notified = self.store.load_notified_set()?;
        let outcome = DedupFilter::filter(&posts, &notified, &settings.policy);
        report.already_notified = outcome.already_notified;
        report.not_recent = outcome.not_recent;

        if outcome.eligible.is_empty() {
            debug!("No posts match tracking criteria");
            return Ok(report);
        }

        for post in &outcome.eligible {
            match notifier.deliver(post).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!("Failed to deliver post {} via {}: {}", post.id, notifier.name(), e);
                    report.failed += 1;
                }
            }
        }

        // Only the ids this tick added; the rest are already stored
        let added = outcome.updated.difference(&notified);
        report.committed = self.store.save_notified_set(&added)?;
        info!("Tick complete: {}", report.summary());

        Ok(report)
    }
}
