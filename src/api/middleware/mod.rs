//! HTTP middleware for request processing.
//!
//! Provides short link interception and observability middleware.

pub mod link_redirects;
pub mod tracing;
