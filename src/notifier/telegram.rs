use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app::{PostwatchError, Result};
use crate::domain::RawPost;
use crate::notifier::{Notifier, NotifierConfig};

/// Sends posts through the Telegram bot API
pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
    chat_id: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(config: &NotifierConfig, bot_token: &str, chat_id: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent("postwatch/0.1.0")
            .build()?;

        Ok(Self {
            client,
            endpoint: Self::endpoint(&config.telegram_api_base, bot_token),
            chat_id: chat_id.to_string(),
        })
    }

    fn endpoint(api_base: &str, bot_token: &str) -> String {
        format!("{}/bot{}/sendMessage", api_base.trim_end_matches('/'), bot_token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(&self, post: &RawPost) -> Result<()> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text: post.message_text(),
        };

        let response = self.client.post(&self.endpoint).json(&payload).send().await?;
        let status = response.status();

        // Telegram explains failures in the body, so read it before the status
        let body: Option<ApiResponse> = response.json().await.ok();
        match body {
            Some(ApiResponse { ok: true, .. }) if status.is_success() => {
                debug!("Telegram accepted post {}", post.id);
                Ok(())
            }
            Some(ApiResponse { description, .. }) => Err(PostwatchError::Delivery(format!(
                "Telegram returned {}: {}",
                status,
                description.unwrap_or_else(|| "no description".to_string())
            ))),
            None => Err(PostwatchError::Delivery(format!(
                "Telegram returned {} with an unreadable body",
                status
            ))),
        }
    }

    fn name(&self) -> &str {
        "telegram"
    }
}
