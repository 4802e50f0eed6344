//! # leadrelay: lead intake for a workshop landing page
//!
//! A visitor fills in a short form (phone, symptoms, optionally name, car and a convenient
//! time). The form posts it to this service, which filters bots, checks the required fields,
//! formats a readable message and forwards it to the workshop's chat through the Telegram Bot
//! API. Staff call the visitor back.
//!
//! ## Pieces
//!
//! - [`api::handlers::leads`]: `POST /api/lead`, the relay endpoint
//! - [`notify`]: message formatting and the outbound bot client, behind [`notify::LeadNotifier`]
//! - [`form`]: the form side: a small state machine, tracking-parameter capture, and the HTTP
//!   transport used to reach the relay
//! - [`cli`]: the `submit` subcommand, which fills in the form from a terminal
//! - [`config`] / [`telemetry`]: layered configuration and tracing setup
//!
//! Nothing is persisted. A lead is either delivered to the chat while the visitor waits, or the
//! visitor is told it was not and offered the phone number instead.
//!
//! ## Running
//!
//! ```bash
//! TG_BOT_TOKEN=123456:ABC TG_CHAT_ID=-1001234567890 leadrelay -f config.yaml
//! ```
//!
//! See [`config`] for every setting.

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod form;
pub mod notify;
mod openapi;
pub mod telemetry;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;

use axum::{
    Json, Router,
    http::{self, HeaderValue, Method},
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use config::CorsOrigin;
use notify::{LeadNotifier, TelegramNotifier};
pub use openapi::ApiDoc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, instrument, warn};
use utoipa::OpenApi;

/// Shared state handed to every handler.
///
/// Configuration is read-only after startup; the notifier is the only outbound collaborator.
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .notifier(Arc::new(TelegramNotifier::new(api_base_url)))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub notifier: Arc<dyn LeadNotifier>,
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.cors;

    // Any wildcard entry opens CORS to every origin, whatever else is listed
    let allow_origin = if cors_config.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.origin().ascii_serialization().parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([http::header::CONTENT_TYPE]);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the router: the relay endpoint, the contact card, health and docs, plus CORS,
/// tracing and (when enabled) Prometheus metrics.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/api/lead", post(api::handlers::leads::submit_lead))
        .route("/api/contact", get(api::handlers::contact::get_contact))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .with_state(state.clone());

    // Installs the process-wide metrics recorder, so this may only happen once per process
    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(create_cors_layer(&state.config)?).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// The relay, configured and ready to serve.
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Set up the relay with the Telegram notifier.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let notifier = Arc::new(TelegramNotifier::new(config.telegram.api_base_url.clone()));
        Self::with_notifier(config, notifier)
    }

    pub fn with_notifier(config: Config, notifier: Arc<dyn LeadNotifier>) -> anyhow::Result<Self> {
        match config.telegram.credentials() {
            Some(credentials) => info!(chat_id = %credentials.chat_id, "Bot credentials configured"),
            None => warn!("TG_BOT_TOKEN / TG_CHAT_ID not set: every valid lead will be answered with HTTP 500"),
        }

        let state = AppState::builder().config(config.clone()).notifier(notifier).build();
        let router = build_router(&state)?;

        Ok(Self { router, config })
    }

    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving; returns once `shutdown` resolves and in-flight requests finish.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Lead relay listening on http://{}", bind_addr);

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
