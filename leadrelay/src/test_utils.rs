//! Test utilities shared by the handler and router tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_test::TestServer;
use url::Url;

use crate::config::{BotCredentials, Config, TelegramConfig};
use crate::notify::{LeadNotifier, NotifyError};
use crate::Application;

pub const TEST_BOT_TOKEN: &str = "test-token";
pub const TEST_CHAT_ID: &str = "test-chat";

/// Config with bot credentials set, pointing the bot API at a port nothing listens on.
pub fn create_test_config() -> Config {
    create_test_config_for("http://127.0.0.1:1")
}

/// Config with bot credentials set, pointing the bot API at `api_base_url`.
pub fn create_test_config_for(api_base_url: &str) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        telegram: TelegramConfig {
            bot_token: Some(TEST_BOT_TOKEN.to_string()),
            chat_id: Some(TEST_CHAT_ID.to_string()),
            api_base_url: Url::parse(api_base_url).expect("valid test URL"),
        },
        enable_metrics: false,
        enable_otel_export: false,
        ..Default::default()
    }
}

/// The real router with the real bot client.
pub fn create_test_app(config: Config) -> TestServer {
    Application::new(config).expect("Failed to build application").into_test_server()
}

/// The real router with `notifier` standing in for the bot API.
pub fn test_server_with(config: Config, notifier: Arc<dyn LeadNotifier>) -> TestServer {
    Application::with_notifier(config, notifier)
        .expect("Failed to build application")
        .into_test_server()
}

/// Records every message instead of sending it.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(BotCredentials, String)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(BotCredentials, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl LeadNotifier for RecordingNotifier {
    async fn send(&self, credentials: &BotCredentials, text: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push((credentials.clone(), text.to_string()));
        Ok(())
    }
}
