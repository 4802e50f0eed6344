//! The lead form's state machine.
//!
//! ```text
//! Idle ──submit──▶ Sending ──ok──────────────▶ Resolved(Sent)
//!   │                 └────not ok / no reply──▶ Resolved(Failed)
//!   └──phone too short───────────────────────▶ Resolved(Failed)
//! ```
//!
//! `Resolved` returns to `Idle` on [`FormController::reset`]. Nothing moves while a
//! request is in flight.

use std::sync::OnceLock;

use url::Url;

use super::tracking::extract_tracking_params;
use super::transport::{LeadTransport, RelayResponse, TransportError};
use crate::api::models::leads::{LeadSubmission, MIN_PHONE_CHARS, TrackingParams};
use crate::config::BusinessContact;

pub const PHONE_TOO_SHORT_MESSAGE: &str = "Укажи телефон (минимум 8 символов).";
pub const REJECTED_FALLBACK_MESSAGE: &str = "Не удалось отправить. Попробуй позвонить.";
pub const UNREACHABLE_FALLBACK_MESSAGE: &str = "Сеть/сервер не ответили. Попробуй позвонить.";

/// The editable fields, as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadForm {
    pub name: String,
    pub phone: String,
    pub car: String,
    pub problem: String,
    pub preferred_time: String,
    /// Hidden from people; only bots fill it in
    pub company: String,
}

impl LeadForm {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent,
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Sending,
    Resolved(SubmitOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("a submission is already in flight")]
    InFlight,
    #[error("no submission is in flight")]
    NotSending,
}

/// Drives one lead form on one page.
pub struct FormController<T> {
    transport: T,
    page_url: Url,
    contact: BusinessContact,
    tracking: OnceLock<TrackingParams>,
    state: FormState,
}

impl<T: LeadTransport> FormController<T> {
    pub fn new(transport: T, page_url: Url, contact: BusinessContact) -> Self {
        Self {
            transport,
            page_url,
            contact,
            tracking: OnceLock::new(),
            state: FormState::Idle,
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Whether the submit control should be enabled.
    pub fn can_submit(&self) -> bool {
        self.state != FormState::Sending
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Tracking parameters of the page, read from its URL once and kept.
    pub fn tracking_params(&self) -> &TrackingParams {
        self.tracking.get_or_init(|| extract_tracking_params(&self.page_url))
    }

    /// The "call instead" action, available in every state.
    pub fn call_href(&self) -> String {
        self.contact.call_href()
    }

    pub fn directions_href(&self) -> &str {
        &self.contact.maps_href
    }

    /// Starts a submission.
    ///
    /// Returns the payload to send, or `None` when the phone number is too short to
    /// bother the relay with; the form is then already resolved with an error.
    pub fn begin(&mut self, form: &LeadForm) -> Result<Option<LeadSubmission>, FormError> {
        if self.state == FormState::Sending {
            return Err(FormError::InFlight);
        }

        if form.phone.trim().chars().count() < MIN_PHONE_CHARS {
            self.state = FormState::Resolved(SubmitOutcome::Failed {
                message: PHONE_TOO_SHORT_MESSAGE.to_string(),
            });
            return Ok(None);
        }

        let submission = LeadSubmission {
            name: trimmed(&form.name),
            phone: trimmed(&form.phone),
            car: trimmed(&form.car),
            problem: trimmed(&form.problem),
            preferred_time: trimmed(&form.preferred_time),
            company: trimmed(&form.company),
            utm: self.tracking_params().clone(),
            page_url: Some(self.page_url.to_string()),
        };

        self.state = FormState::Sending;
        Ok(Some(submission))
    }

    /// Applies the relay's answer to the submission started by [`begin`](Self::begin).
    ///
    /// On success the form's fields are cleared.
    pub fn complete(
        &mut self,
        result: Result<RelayResponse, TransportError>,
        form: &mut LeadForm,
    ) -> Result<(), FormError> {
        if self.state != FormState::Sending {
            return Err(FormError::NotSending);
        }

        let outcome = match result {
            Ok(response) if response.is_success() => {
                form.clear();
                SubmitOutcome::Sent
            }
            Ok(response) => {
                tracing::debug!(status = response.status, "Relay refused lead");
                SubmitOutcome::Failed {
                    message: response
                        .error
                        .filter(|message| !message.is_empty())
                        .unwrap_or_else(|| REJECTED_FALLBACK_MESSAGE.to_string()),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Relay unreachable");
                SubmitOutcome::Failed {
                    message: UNREACHABLE_FALLBACK_MESSAGE.to_string(),
                }
            }
        };

        self.state = FormState::Resolved(outcome);
        Ok(())
    }

    /// One submit action: at most one request to the relay, never retried.
    pub async fn submit(&mut self, form: &mut LeadForm) -> Result<&FormState, FormError> {
        if let Some(submission) = self.begin(form)? {
            let result = self.transport.post_lead(&submission).await;
            self.complete(result, form)?;
        }
        Ok(&self.state)
    }

    /// Reopens the form. Refused while a request is in flight.
    pub fn reset(&mut self) -> Result<(), FormError> {
        if self.state == FormState::Sending {
            return Err(FormError::InFlight);
        }
        self.state = FormState::Idle;
        Ok(())
    }
}

fn trimmed(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
