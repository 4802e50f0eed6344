//! HTTP handler for the lead relay endpoint.
//!
//! ```text
//! POST /api/lead
//!   ├─ parse body                  → 400 "Bad request" on any parse/shape failure
//!   ├─ honeypot filled?            → 200 { ok: true }, nothing sent
//!   ├─ phone ≥ 8 chars, problem?   → 400 on failure
//!   ├─ bot credentials configured? → 500 on failure
//!   ├─ format notification
//!   └─ one sendMessage call        → 500 + details on rejection, else 200 { ok: true }
//! ```
//!
//! The relay holds no state between requests. Every valid request produces exactly one
//! notification, so resubmitting the same lead notifies twice.

use axum::{Json, body::Bytes, extract::State};
use metrics::counter;

use crate::{
    AppState,
    api::models::leads::{LeadSubmission, RelayAck, RelayErrorBody, honeypot_filled},
    errors::{Error, Result},
    notify::Lead,
};

pub const MISSING_CREDENTIALS_MESSAGE: &str = "Не настроены TG_BOT_TOKEN / TG_CHAT_ID";

fn record_outcome(outcome: &'static str) {
    counter!("leadrelay_leads_total", "outcome" => outcome).increment(1);
}

fn malformed(e: serde_json::Error) -> Error {
    record_outcome("malformed");
    Error::MalformedBody { reason: e.to_string() }
}

#[utoipa::path(
    post,
    path = "/api/lead",
    tag = "leads",
    summary = "Submit a lead",
    description = "Validate a lead from the landing page form and forward it to the workshop's messaging bot",
    request_body = LeadSubmission,
    responses(
        (status = 200, description = "Lead accepted", body = RelayAck),
        (status = 400, description = "Malformed body, or phone/symptoms missing", body = RelayErrorBody),
        (status = 500, description = "Bot credentials missing, or the bot API rejected the message", body = RelayErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn submit_lead(State(state): State<AppState>, body: Bytes) -> Result<Json<RelayAck>> {
    // Parsed by hand so that every malformed body gets the same answer, whatever its content type
    let raw: serde_json::Value = serde_json::from_slice(&body).map_err(malformed)?;

    // Answer exactly like a delivered lead so automated submitters cannot tell they were filtered
    if honeypot_filled(&raw) {
        record_outcome("spam");
        tracing::info!("Honeypot field filled, discarding submission");
        return Ok(Json(RelayAck::OK));
    }

    let submission: LeadSubmission = serde_json::from_value(raw).map_err(malformed)?;

    let lead = Lead::from_submission(submission).inspect_err(|_| record_outcome("invalid"))?;

    let Some(credentials) = state.config.telegram.credentials() else {
        record_outcome("unconfigured");
        return Err(Error::Configuration {
            message: MISSING_CREDENTIALS_MESSAGE.to_string(),
        });
    };

    let text = lead.notification_text();

    if let Err(e) = state.notifier.send(&credentials, &text).await {
        record_outcome("upstream_error");
        tracing::warn!(error = %e, "Lead notification was not delivered");
        return Err(Error::Upstream { details: e.details() });
    }

    record_outcome("delivered");
    tracing::info!(
        has_name = !lead.name.is_empty(),
        has_car = !lead.car.is_empty(),
        tracking_params = lead.utm.len(),
        "Lead delivered"
    );

    Ok(Json(RelayAck::OK))
}
