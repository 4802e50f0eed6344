//! Lead notifications for workshop staff.
//!
//! - [`message`]: validation of incoming leads and the text staff receive
//! - [`telegram`]: the [`LeadNotifier`] seam and its bot API implementation

pub mod message;
pub mod telegram;

pub use message::Lead;
pub use telegram::{LeadNotifier, NotifyError, TelegramNotifier};
