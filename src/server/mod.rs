//! HTTP server.
//!
//! - [`api`]: Router, request/response types and route handlers
//! - [`pipeline`]: Shared prepare → invoke → respond pipeline
//! - [`error`]: Error-to-response mapping

pub mod api;
pub mod error;
pub mod pipeline;
