//! Delivery of eligible posts to a chat channel.
//!
//! Delivery is a single attempt per post. Failures are reported to the
//! caller and never retried here.

mod config;
mod telegram;
mod webhook;

pub use config::{Channel, NotifierConfig, TELEGRAM_API_BASE};
pub use telegram::TelegramNotifier;
pub use webhook::WebhookNotifier;

use async_trait::async_trait;
use tracing::info;

use crate::app::{PostwatchError, Result};
use crate::domain::RawPost;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, post: &RawPost) -> Result<()>;

    fn name(&self) -> &str;
}

/// Writes posts to the log instead of sending them anywhere
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, post: &RawPost) -> Result<()> {
        info!(
            post_id = %post.id,
            author = %post.display_author(),
            link = %post.link,
            "New post"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Build the notifier selected by `config`
pub fn build_notifier(config: &NotifierConfig) -> Result<Box<dyn Notifier>> {
    match config.channel {
        Channel::Log => Ok(Box::new(LogNotifier)),
        Channel::Telegram => {
            let bot_token = non_empty(config.bot_token.as_deref())
                .ok_or_else(|| PostwatchError::Config("notifier.bot_token is required".into()))?;
            let chat_id = non_empty(config.chat_id.as_deref())
                .ok_or_else(|| PostwatchError::Config("notifier.chat_id is required".into()))?;
            Ok(Box::new(TelegramNotifier::new(config, bot_token, chat_id)?))
        }
        Channel::Webhook => {
            let url = non_empty(config.webhook_url.as_deref())
                .ok_or_else(|| PostwatchError::Config("notifier.webhook_url is required".into()))?;
            Ok(Box::new(WebhookNotifier::new(config, url)?))
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// One-shot HTTP endpoint for exercising the real delivery paths
#[cfg(test)]
pub(crate) mod test_server {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Answer the first request with `status` and `body`, returning the base
    /// URL and a handle resolving to the raw request that was received.
    pub(crate) async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            request
        });

        (format!("http://{}", addr), handle)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_log_notifier() {
        let notifier = build_notifier(&NotifierConfig::default()).unwrap();
        assert_eq!(notifier.name(), "log");
        assert!(tokio_test::block_on(notifier.deliver(&RawPost::new("p1"))).is_ok());
    }

    #[test]
    fn test_build_telegram_requires_credentials() {
        let mut config = NotifierConfig {
            channel: Channel::Telegram,
            ..Default::default()
        };
        assert!(matches!(build_notifier(&config), Err(PostwatchError::Config(_))));

        config.bot_token = Some("123:abc".into());
        config.chat_id = Some("  ".into());
        assert!(matches!(build_notifier(&config), Err(PostwatchError::Config(_))));

        config.chat_id = Some("-100".into());
        assert_eq!(build_notifier(&config).unwrap().name(), "telegram");
    }

    #[test]
    fn test_build_webhook() {
        let mut config = NotifierConfig {
            channel: Channel::Webhook,
            ..Default::default()
        };
        assert!(matches!(build_notifier(&config), Err(PostwatchError::Config(_))));

        config.webhook_url = Some("::bad::".into());
        assert!(matches!(build_notifier(&config), Err(PostwatchError::InvalidUrl(_))));

        config.webhook_url = Some("https://hooks.example.com/x".into());
        assert_eq!(build_notifier(&config).unwrap().name(), "webhook");
    }
}
