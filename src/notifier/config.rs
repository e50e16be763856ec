use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Where eligible posts are sent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Only log the post; useful while tuning selectors
    #[default]
    Log,
    /// Telegram bot `sendMessage`
    Telegram,
    /// JSON POST to an arbitrary webhook URL
    Webhook,
}

/// Configuration for the delivery channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub channel: Channel,

    /// Telegram bot token
    pub bot_token: Option<String>,

    /// Telegram chat id (numeric id or @channel name)
    pub chat_id: Option<String>,

    /// Telegram API base URL (default: https://api.telegram.org)
    pub telegram_api_base: String,

    /// Target of the webhook channel
    pub webhook_url: Option<String>,

    /// Request timeout in seconds (default: 10)
    pub timeout_secs: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            channel: Channel::Log,
            bot_token: None,
            chat_id: None,
            telegram_api_base: TELEGRAM_API_BASE.to_string(),
            webhook_url: None,
            timeout_secs: 10,
        }
    }
}

impl NotifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NotifierConfig::default();
        assert_eq!(config.channel, Channel::Log);
        assert_eq!(config.telegram_api_base, TELEGRAM_API_BASE);
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_parse_telegram_section() {
        let config: NotifierConfig = toml::from_str(
            r#"
channel = "telegram"
bot_token = "123:abc"
chat_id = "-10042"
"#,
        )
        .unwrap();
        assert_eq!(config.channel, Channel::Telegram);
        assert_eq!(config.bot_token.as_deref(), Some("123:abc"));
        assert_eq!(config.chat_id.as_deref(), Some("-10042"));
        assert_eq!(config.timeout_secs, 10);
    }
}
