//! HTTP layer.
//!
//! # Modules
//!
//! - [`dto`] - Response bodies
//! - [`handlers`] - Health check and fallback handlers
//! - [`middleware`] - Short link interception and request tracing

pub mod dto;
pub mod handlers;
pub mod middleware;
