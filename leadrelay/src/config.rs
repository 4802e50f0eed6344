//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `LEADRELAY_CONFIG`
//! environment variable. A missing file is fine: every field has a default.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `LEADRELAY_` override YAML values
//! 3. **TG_BOT_TOKEN / TG_CHAT_ID** - Special case: override `telegram.bot_token` and
//!    `telegram.chat_id` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `LEADRELAY_TELEGRAM__API_BASE_URL=http://localhost:8081` sets `telegram.api_base_url`.
//!
//! ## Bot credentials
//!
//! The bot token and destination chat are deliberately optional. A relay started without them
//! still serves the page's endpoint; each submission is then answered with a configuration error
//! (HTTP 500) until an operator supplies them.
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Override server port
//! LEADRELAY_PORT=8080
//!
//! # Bot credentials (preferred method)
//! TG_BOT_TOKEN="123456:ABC-DEF"
//! TG_CHAT_ID="-1001234567890"
//!
//! # Or the prefixed form
//! LEADRELAY_TELEGRAM__BOT_TOKEN="123456:ABC-DEF"
//! ```

use clap::{Parser, Subcommand};
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

use crate::errors::Error;

/// CLI args: config file location plus an optional one-shot command
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "LEADRELAY_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Submit one lead to a running relay, exactly as the landing page form does
    Submit(SubmitArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct SubmitArgs {
    /// Relay endpoint to post the lead to
    #[arg(long, default_value = "http://localhost:3001/api/lead")]
    pub endpoint: Url,
    /// Page URL the lead is attributed to (its utm_* query parameters are forwarded)
    #[arg(long, default_value = "http://localhost:3001/")]
    pub page_url: Url,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub problem: String,
    #[arg(long, default_value = "")]
    pub name: String,
    #[arg(long, default_value = "")]
    pub car: String,
    #[arg(long, default_value = "")]
    pub preferred_time: String,
}

/// Main application configuration.
///
/// All fields have defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Messaging bot the leads are forwarded to
    pub telegram: TelegramConfig,
    /// Contact card shown next to the form; also the "call instead" fallback
    pub business: BusinessContact,
    /// CORS settings for the relay endpoint
    pub cors: CorsConfig,
    /// Enable Prometheus metrics endpoint at `/internal/metrics`
    pub enable_metrics: bool,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

/// Messaging bot configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelegramConfig {
    /// Bot token, used as a path component of every API call
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "parse_secret")]
    pub bot_token: Option<String>,
    /// Chat (or channel) the lead notifications are addressed to. Numeric ids such as
    /// `-1001234567890` are accepted unquoted.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "parse_secret")]
    pub chat_id: Option<String>,
    /// Base URL of the bot API
    pub api_base_url: Url,
}

/// Bot token and destination chat, only ever constructed when both are present.
#[derive(Clone, PartialEq, Eq)]
pub struct BotCredentials {
    pub token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for BotCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotCredentials")
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl TelegramConfig {
    /// Both secrets, or `None` if either is missing or blank.
    pub fn credentials(&self) -> Option<BotCredentials> {
        let token = self.bot_token.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
        let chat_id = self.chat_id.as_deref().map(str::trim).filter(|c| !c.is_empty())?;
        Some(BotCredentials {
            token: token.to_string(),
            chat_id: chat_id.to_string(),
        })
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base_url: Url::parse("https://api.telegram.org").expect("static URL is valid"),
        }
    }
}

/// Business contact card.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(default, deny_unknown_fields)]
pub struct BusinessContact {
    /// Dialable phone number, used for `tel:` links
    pub phone_raw: String,
    /// Phone number as displayed to visitors
    pub phone_pretty: String,
    /// Street address of the workshop
    pub address: String,
    /// Link to the workshop on a map service
    pub maps_href: String,
}

impl BusinessContact {
    pub fn call_href(&self) -> String {
        format!("tel:{}", self.phone_raw)
    }
}

impl Default for BusinessContact {
    fn default() -> Self {
        Self {
            phone_raw: "+79049724641".to_string(),
            phone_pretty: "+7 (904) 972-46-41".to_string(),
            address: "Челябинск, Запорожская 8".to_string(),
            maps_href: "https://yandex.ru/maps/?text=%D0%A7%D0%B5%D0%BB%D1%8F%D0%B1%D0%B8%D0%BD%D1%81%D0%BA%20%D0%97%D0%B0%D0%BF%D0%BE%D1%80%D0%BE%D0%B6%D1%81%D0%BA%D0%B0%D1%8F%208".to_string(),
        }
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![CorsOrigin::Url(Url::parse("http://localhost:3000").expect("static URL is valid"))],
            max_age: Some(3600),
        }
    }
}

/// A single allowed CORS origin.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://service.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

/// Env and YAML values are typed on parsing, so a numeric chat id arrives as an integer.
#[derive(Deserialize)]
#[serde(untagged)]
enum SecretValue {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

fn parse_secret<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<SecretValue> = Deserialize::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        SecretValue::Text(s) => s,
        SecretValue::Signed(n) => n.to_string(),
        SecretValue::Unsigned(n) => n.to_string(),
    }))
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            telegram: TelegramConfig::default(),
            business: BusinessContact::default(),
            cors: CorsConfig::default(),
            enable_metrics: false,
            enable_otel_export: false,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields.
    ///
    /// Missing bot credentials are not rejected here; see the module docs.
    pub fn validate(&self) -> Result<(), Error> {
        if self.cors.allowed_origins.is_empty() {
            return Err(Error::Configuration {
                message: "Config validation: CORS allowed_origins cannot be empty. Add at least one allowed origin.".to_string(),
            });
        }

        if !matches!(self.telegram.api_base_url.scheme(), "http" | "https") {
            return Err(Error::Configuration {
                message: format!(
                    "Config validation: telegram.api_base_url must be an http(s) URL, got scheme '{}'",
                    self.telegram.api_base_url.scheme()
                ),
            });
        }

        if self.business.phone_raw.trim().is_empty() {
            return Err(Error::Configuration {
                message: "Config validation: business.phone_raw cannot be empty, it backs the 'call instead' action".to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Prefixed environment variables override specific values
            .merge(Env::prefixed("LEADRELAY_").ignore(&["config"]).split("__"))
            // Conventional names for the two bot secrets
            .merge(Env::raw().only(&["TG_BOT_TOKEN"]).map(|_| "telegram.bot_token".into()))
            .merge(Env::raw().only(&["TG_CHAT_ID"]).map(|_| "telegram.chat_id".into()))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
