use crate::config::FetchConfig;
use crate::types::{Result, SummarizerError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const SLACK_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Posts one summarized article to the chat destination.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, link: &str, summary: &str) -> Result<()>;
}

pub struct SlackNotifier {
    client: Client,
    token: String,
    channel: String,
}

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
}

// Slack reports logical failures as HTTP 200 with ok=false.
#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    error: Option<String>,
}

impl SlackNotifier {
    pub fn new(config: &FetchConfig, token: String, channel: String) -> Self {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            token,
            channel,
        }
    }
}

pub fn format_message(title: &str, link: &str, summary: &str) -> String {
    format!("New Article: *<{}|{}>*\nSummary: {}", link, title, summary)
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, title: &str, link: &str, summary: &str) -> Result<()> {
        let text = format_message(title, link, summary);
        let request = PostMessageRequest {
            channel: &self.channel,
            text: &text,
        };

        let response = self
            .client
            .post(SLACK_POST_MESSAGE_URL)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| SummarizerError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SummarizerError::Delivery(format!("HTTP {}", status)));
        }

        let body: PostMessageResponse = response
            .json()
            .await
            .map_err(|e| SummarizerError::Delivery(e.to_string()))?;

        if !body.ok {
            return Err(SummarizerError::Delivery(
                body.error.unwrap_or_else(|| "unknown Slack error".to_string()),
            ));
        }

        debug!("Posted summary for {} to {}", link, self.channel);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_links_the_title_and_carries_the_summary() {
        let text = format_message(
            "Rates held steady",
            "https://example.com/rates",
            "The central bank left rates unchanged.",
        );
        assert_eq!(
            text,
            "New Article: *<https://example.com/rates|Rates held steady>*\nSummary: The central bank left rates unchanged."
        );
    }

    #[test]
    fn error_response_body_decodes() {
        let body: PostMessageResponse =
            serde_json::from_str(r#"{"ok": false, "error": "channel_not_found"}"#).unwrap();
        assert!(!body.ok);
        assert_eq!(body.error.as_deref(), Some("channel_not_found"));
    }

    #[test]
    fn success_response_body_decodes_without_error_field() {
        let body: PostMessageResponse =
            serde_json::from_str(r#"{"ok": true, "channel": "C123", "ts": "1.2"}"#).unwrap();
        assert!(body.ok);
        assert!(body.error.is_none());
    }
}
