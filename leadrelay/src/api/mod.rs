//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - `POST /api/lead`: relay a lead to the workshop's messaging bot
//! - `GET /api/contact`: contact card shown next to the form
//!
//! The OpenAPI document is served at `/api-docs/openapi.json`.

pub mod handlers;
pub mod models;
