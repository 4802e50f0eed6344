//! HTTP handler for the workshop's contact card.

use axum::{Json, extract::State, response::IntoResponse};

use crate::{AppState, config::BusinessContact};

#[utoipa::path(
    get,
    path = "/api/contact",
    tag = "contact",
    summary = "Get contact card",
    description = "Phone, address and map link offered next to the lead form as the 'call instead' alternative",
    responses(
        (status = 200, description = "Contact card", body = BusinessContact),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_contact(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.config.business.clone())
}
