//! Outbound client for the messaging bot API.
//!
//! One `sendMessage` call per lead, addressed to the configured chat, with link previews
//! disabled. Nothing is retried: a failed call is surfaced to the visitor, who can resubmit
//! or phone the workshop instead.

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use crate::config::BotCredentials;

/// Diagnostic detail kept from a rejecting bot API response, in characters.
pub const MAX_DETAILS_CHARS: usize = 300;

/// Errors from delivering a notification
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The bot API answered with a non-success status
    #[error("bot API responded with HTTP {status}: {details}")]
    Rejected { status: u16, details: String },

    /// The request never got a response
    #[error("bot API request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl NotifyError {
    /// Detail safe to hand back to the relay's caller.
    pub fn details(&self) -> String {
        match self {
            NotifyError::Rejected { details, .. } => details.clone(),
            NotifyError::Transport(e) => e.to_string(),
        }
    }
}

/// Delivers lead notifications to staff.
///
/// Implementations must send at most one message per call.
#[async_trait]
pub trait LeadNotifier: Send + Sync {
    async fn send(&self, credentials: &BotCredentials, text: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

/// [`LeadNotifier`] backed by the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base_url: Url,
}

impl TelegramNotifier {
    /// The transport's default timeouts apply; none are configured here.
    pub fn new(api_base_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base_url,
        }
    }

    fn send_message_url(&self, token: &str) -> String {
        format!("{}/bot{}/sendMessage", self.api_base_url.as_str().trim_end_matches('/'), token)
    }
}

#[async_trait]
impl LeadNotifier for TelegramNotifier {
    #[tracing::instrument(skip_all, fields(chat_id = %credentials.chat_id))]
    async fn send(&self, credentials: &BotCredentials, text: &str) -> Result<(), NotifyError> {
        let body = SendMessage {
            chat_id: &credentials.chat_id,
            text,
            disable_web_page_preview: true,
        };

        // The token is part of the URL, so it is stripped from any transport error
        let response = self
            .client
            .post(self.send_message_url(&credentials.token))
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(status = status.as_u16(), "Bot API accepted message");
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            details: truncate_chars(&text, MAX_DETAILS_CHARS),
        })
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> BotCredentials {
        BotCredentials {
            token: "123:abc".to_string(),
            chat_id: "-100500".to_string(),
        }
    }

    fn notifier(server: &MockServer) -> TelegramNotifier {
        TelegramNotifier::new(Url::parse(&server.uri()).unwrap())
    }

    #[tokio::test]
    async fn test_send_message_request_shape() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_json(json!({
                "chat_id": "-100500",
                "text": "hello",
                "disable_web_page_preview": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&mock_server)
            .await;

        notifier(&mock_server).send(&credentials(), "hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_base_url_with_trailing_path_slash() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tg/bot123:abc/sendMessage"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let base = Url::parse(&format!("{}/tg/", mock_server.uri())).unwrap();
        TelegramNotifier::new(base).send(&credentials(), "hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejection_keeps_body_as_details() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let err = notifier(&mock_server).send(&credentials(), "hello").await.unwrap_err();

        assert!(matches!(err, NotifyError::Rejected { status: 429, .. }));
        assert_eq!(err.details(), "rate limited");
    }

    #[tokio::test]
    async fn test_rejection_details_are_truncated() {
        let mock_server = MockServer::start().await;
        let long_body = "ошибка ".repeat(100);
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string(long_body.clone()))
            .mount(&mock_server)
            .await;

        let err = notifier(&mock_server).send(&credentials(), "hello").await.unwrap_err();
        let details = err.details();

        assert_eq!(details.chars().count(), MAX_DETAILS_CHARS);
        assert!(long_body.starts_with(&details));
    }

    #[tokio::test]
    async fn test_network_error_hides_token() {
        // Point to a port that's not listening
        let notifier = TelegramNotifier::new(Url::parse("http://127.0.0.1:1").unwrap());

        let err = notifier.send(&credentials(), "hello").await.unwrap_err();

        assert!(matches!(err, NotifyError::Transport(_)));
        assert!(!err.details().contains("123:abc"));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abc", 300), "abc");
        assert_eq!(truncate_chars("", 3), "");
        assert_eq!(truncate_chars("ёжик", 2), "ёж");
    }
}
