//! Client side of the lead pipeline: the form a visitor fills in.
//!
//! The [`FormController`] owns the form's state and talks to the relay through a
//! [`LeadTransport`]. Campaign tracking parameters come from the page URL, see [`tracking`].

pub mod controller;
pub mod tracking;
pub mod transport;

pub use controller::{FormController, FormError, FormState, LeadForm, SubmitOutcome};
pub use transport::{HttpLeadTransport, LeadTransport, RelayResponse, TransportError};
