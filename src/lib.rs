//! # postwatch
//!
//! Watches a social-media page in a headless browser and forwards posts it
//! has not seen before to a chat bot.
//!
//! ## Architecture
//!
//! ```text
//! Daemon tick → Scraper → DedupFilter → Notifier
//!                              ↕
//!                        NotifiedStore
//! ```
//!
//! - [`scraper`]: reloads the monitored page and extracts posts
//! - [`filter`]: decides which posts are new and recent enough
//! - [`notifier`]: Telegram / webhook delivery
//! - [`store`]: SQLite persistence of notified post ids
//! - [`daemon`]: the periodic refresh cycle
//!
//! ## Quick Start
//!
//! ```bash
//! # Check the configuration (created on first use)
//! postwatch config check
//!
//! # See what would be delivered right now
//! postwatch preview
//!
//! # Run the refresh cycle
//! postwatch daemon start
//!
//! # Forget everything already notified
//! postwatch clear
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires the store to the
/// configuration file and launches trackers.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration file (`~/.config/postwatch/config.toml`).
pub mod config;

/// Background daemon driving the refresh cycle.
///
/// - `postwatch daemon start` - Start the refresh cycle
/// - `postwatch daemon stop` - Stop the daemon
/// - `postwatch daemon status` - Check if daemon is running
pub mod daemon;

/// Core domain models.
///
/// - [`RawPost`](domain::RawPost): a scraped post
/// - [`NotifiedSet`](domain::NotifiedSet): ids already delivered
/// - [`RecencyPolicy`](domain::RecencyPolicy): "new enough" rule
pub mod domain;

/// Deduplication and recency filtering.
pub mod filter;

/// Delivery channels.
pub mod notifier;

/// Browser-based post scraping via chromiumoxide.
pub mod scraper;

/// SQLite persistence layer.
///
/// - [`NotifiedStore`](store::NotifiedStore): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;

/// One scrape → filter → deliver pass.
pub mod tracker;
