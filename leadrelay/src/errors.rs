use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

use crate::api::models::leads::RelayErrorBody;

/// Message returned for any body that cannot be read as a lead.
pub const BAD_REQUEST_MESSAGE: &str = "Bad request";

/// Message returned when the bot API refuses the notification.
pub const UPSTREAM_ERROR_MESSAGE: &str = "Telegram API error";

#[derive(ThisError, Debug)]
pub enum Error {
    /// Request body is not JSON, or not shaped like a lead
    #[error("Malformed request body: {reason}")]
    MalformedBody { reason: String },

    /// Required lead fields missing or too short
    #[error("{message}")]
    Validation { message: String },

    /// Operator-side misconfiguration (missing bot secrets, invalid config values)
    #[error("{message}")]
    Configuration { message: String },

    /// The messaging bot API did not accept the notification
    #[error("Upstream error: {details}")]
    Upstream { details: String },
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MalformedBody { .. } | Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::Configuration { .. } | Error::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the response body, without leaking internal implementation details
    pub fn body(&self) -> RelayErrorBody {
        match self {
            Error::MalformedBody { .. } => RelayErrorBody::new(BAD_REQUEST_MESSAGE),
            Error::Validation { message } | Error::Configuration { message } => RelayErrorBody::new(message.clone()),
            Error::Upstream { details } => RelayErrorBody::new(UPSTREAM_ERROR_MESSAGE).with_details(details.clone()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Different log levels based on who can fix it
        match &self {
            Error::Configuration { .. } => {
                tracing::error!("Configuration error: {}", self);
            }
            Error::Upstream { .. } => {
                tracing::error!("Upstream error: {}", self);
            }
            Error::MalformedBody { .. } | Error::Validation { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        (self.status_code(), Json(self.body())).into_response()
    }
}

/// Type alias for relay operation results
pub type Result<T> = std::result::Result<T, Error>;
