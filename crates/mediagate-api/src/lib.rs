//! Mediagate API
//!
//! HTTP surface for the upload pipeline: a single multipart upload endpoint,
//! health and the OpenAPI document.

pub mod api_doc;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;
pub mod utils;
