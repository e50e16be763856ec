use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::app::{PostwatchError, Result};
use crate::domain::RawPost;
use crate::notifier::{Notifier, NotifierConfig};

/// Posts a JSON body to a chat webhook (Discord/Slack-compatible `content`)
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: String,
    post: &'a RawPost,
}

impl WebhookNotifier {
    pub fn new(config: &NotifierConfig, url: &str) -> Result<Self> {
        url::Url::parse(url)?;

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent("postwatch/0.1.0")
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn deliver(&self, post: &RawPost) -> Result<()> {
        let payload = WebhookPayload {
            content: post.message_text(),
            post,
        };

        let response = self.client.post(&self.url).json(&payload).send().await?;
        response
            .error_for_status_ref()
            .map_err(|e| PostwatchError::Delivery(format!("Webhook rejected post {}: {}", post.id, e)))?;

        Ok(())
    }

    fn name(&self) -> &str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::test_server::serve_once;

    #[test]
    fn test_rejects_invalid_url() {
        let config = NotifierConfig::default();
        assert!(WebhookNotifier::new(&config, "not a url").is_err());
        assert!(WebhookNotifier::new(&config, "https://hooks.example.com/abc").is_ok());
    }

    #[test]
    fn test_payload_includes_post_fields() {
        let mut post = RawPost::new("42").with_label("2m");
        post.content = "hello".into();
        let payload = WebhookPayload {
            content: post.message_text(),
            post: &post,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["content"], "Unknown\n\nhello");
        assert_eq!(value["post"]["id"], "42");
        assert_eq!(value["post"]["recency_label"], "2m");
    }

    #[tokio::test]
    async fn test_deliver_success() {
        let (base, server) = serve_once("200 OK", "").await;
        let notifier = WebhookNotifier::new(&NotifierConfig::default(), &format!("{}/hook", base)).unwrap();

        notifier.deliver(&RawPost::new("42").with_label("1m")).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /hook"));
        assert!(request.contains(r#""content":"#));
        assert!(request.contains(r#""id":"42""#));
    }

    #[tokio::test]
    async fn test_deliver_non_success_status() {
        let (base, server) = serve_once("500 Internal Server Error", r#"{"error":"nope"}"#).await;
        let notifier = WebhookNotifier::new(&NotifierConfig::default(), &format!("{}/hook", base)).unwrap();

        let result = notifier.deliver(&RawPost::new("42")).await;
        server.await.unwrap();

        match result {
            Err(PostwatchError::Delivery(msg)) => assert!(msg.contains("42")),
            other => panic!("expected delivery error, got {:?}", other),
        }
    }
}
