//! HTTP request handlers.
//!
//! - [`leads`]: the lead relay endpoint the landing page form posts to
//! - [`contact`]: the workshop's contact card, the form's "call instead" alternative
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which converts to the matching HTTP status and a
//! `{ "error": ..., "details"?: ... }` JSON body.

pub mod contact;
pub mod leads;
