//! Configuration management for postwatch.
//!
//! Configuration is read from `~/.config/postwatch/config.toml`. If the file
//! doesn't exist, a default configuration with comments is created. The
//! daemon re-reads the file on every tick, so edits apply without a restart.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::daemon::DaemonConfig;
use crate::domain::policy::DEFAULT_WINDOW_HOURS;
use crate::domain::RecencyPolicy;
use crate::notifier::NotifierConfig;
use crate::scraper::{host_matches, ScraperConfig};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tracker: TrackerConfig,
    pub policy: PolicyConfig,
    pub scraper: ScraperConfig,
    pub notifier: NotifierConfig,
}

/// What to monitor and how often.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Page to monitor
    pub url: String,
    /// Refresh interval ("30s", "2m", "1h")
    pub refresh_interval: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            refresh_interval: "30s".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecencyMode {
    #[default]
    RelativeLabel,
    AbsoluteWindow,
}

/// Recency policy as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub mode: RecencyMode,
    /// Builds the `1m..<minutes>m` allowlist when `labels` is not set
    pub minutes: u32,
    /// Explicit label allowlist for `relative_label`
    pub labels: Option<Vec<String>>,
    /// Window for `absolute_window`
    pub window_hours: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            mode: RecencyMode::RelativeLabel,
            minutes: 5,
            labels: None,
            window_hours: DEFAULT_WINDOW_HOURS,
        }
    }
}

impl PolicyConfig {
    pub fn to_policy(&self) -> RecencyPolicy {
        match self.mode {
            RecencyMode::RelativeLabel => match self.labels {
                Some(ref labels) => RecencyPolicy::labels(labels.iter().map(|l| l.trim())),
                None => RecencyPolicy::minutes(self.minutes),
            },
            RecencyMode::AbsoluteWindow => RecencyPolicy::window_hours(self.window_hours),
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from `path`, creating a commented default file if missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::create_default_config(path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/postwatch/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("postwatch").join("config.toml"))
    }

    /// Check the settings a tick depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.tracker.url.trim();
        if url.is_empty() {
            return Err(ConfigError::Invalid("tracker.url is not set".into()));
        }

        let parsed = Url::parse(url)
            .map_err(|e| ConfigError::Invalid(format!("tracker.url is not a valid URL: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "tracker.url must be http or https, got {}",
                parsed.scheme()
            )));
        }
        let host = parsed.host_str().unwrap_or("");
        if !host_matches(host, &self.scraper.site_host) {
            return Err(ConfigError::Invalid(format!(
                "tracker.url must point at {}",
                self.scraper.site_host
            )));
        }

        DaemonConfig::parse_interval(&self.tracker.refresh_interval)
            .map_err(|e| ConfigError::Invalid(format!("tracker.refresh_interval: {}", e)))?;

        if self.policy.mode == RecencyMode::AbsoluteWindow
            && !(self.policy.window_hours.is_finite() && self.policy.window_hours > 0.0)
        {
            return Err(ConfigError::Invalid(
                "policy.window_hours must be a positive number".into(),
            ));
        }

        Ok(())
    }

    /// Refresh interval in seconds, once validated.
    pub fn refresh_interval_secs(&self) -> Result<u64, ConfigError> {
        DaemonConfig::parse_interval(&self.tracker.refresh_interval)
            .map_err(|e| ConfigError::Invalid(format!("tracker.refresh_interval: {}", e)))
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# postwatch configuration

[tracker]
# Page to monitor, e.g. "https://www.facebook.com/groups/123456789"
url = ""

# How often the page is reloaded ("30s", "2m", "1h")
refresh_interval = "30s"

[policy]
# "relative_label": deliver posts whose time label is in the allowlist
# "absolute_window": deliver posts whose derived timestamp is within window_hours
mode = "relative_label"

# Allowlist "1m" .. "<minutes>m" (ignored when labels is set)
minutes = 5

# Explicit allowlist, compared literally against the page's label
# labels = ["1m", "2m", "3m", "4m", "5m"]

window_hours = 24.0

[scraper]
# Run browser in headless mode (no visible window)
headless = true

# Page load timeout in seconds
timeout_secs = 30

# Wait time after page load for dynamic content (milliseconds)
wait_after_load_ms = 2000

# Scroll-to-bottom passes after each reload, and the wait after each
scroll_passes = 1
scroll_wait_ms = 1500

site_host = "facebook.com"
base_url = "https://www.facebook.com"
post_selector = 'div[role="article"]'
author_selector = 'h3 a[role="link"] strong span'
content_selector = 'div[dir="auto"]'
permalink_selector = 'a[aria-label][href*="/posts/"]'
permalink_marker = "/posts/"

[notifier]
# "log", "telegram" or "webhook"
channel = "log"

# bot_token = "123456:ABC..."
# chat_id = "-1001234567890"
# webhook_url = "https://discord.com/api/webhooks/..."

timeout_secs = 10
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
