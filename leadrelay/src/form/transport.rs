//! The form's single network hop: posting a lead to the relay.

use async_trait::async_trait;
use url::Url;

use crate::api::models::leads::{LeadSubmission, RelayErrorBody};

/// What came back from the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse {
    pub status: u16,
    /// The relay's `error` message, if the response was a failure carrying one
    pub error: Option<String>,
}

impl RelayResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The relay could not be reached, or its response could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("relay request failed: {0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self(err.to_string())
    }
}

/// Sends a lead to the relay. Called exactly once per submit action.
#[async_trait]
pub trait LeadTransport: Send + Sync {
    async fn post_lead(&self, submission: &LeadSubmission) -> Result<RelayResponse, TransportError>;
}

/// [`LeadTransport`] posting JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpLeadTransport {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpLeadTransport {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl LeadTransport for HttpLeadTransport {
    #[tracing::instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn post_lead(&self, submission: &LeadSubmission) -> Result<RelayResponse, TransportError> {
        let response = self.client.post(self.endpoint.clone()).json(submission).send().await?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Relay responded");

        // A failure body that is not the relay's JSON still counts as a failure, just without a message
        let error = if status.is_success() {
            None
        } else {
            response.json::<RelayErrorBody>().await.ok().map(|body| body.error)
        };

        Ok(RelayResponse {
            status: status.as_u16(),
            error,
        })
    }
}
