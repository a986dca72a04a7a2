//! Infrastructure layer for external integrations.
//!
//! Implements interfaces defined by the domain layer.
//!
//! - [`cache`] - Caching abstractions (Redis and no-op implementations)
//! - [`persistence`] - PostgreSQL, in-memory and cached repositories
//! - [`subscribers`] - Consumers of redirect events

pub mod cache;
pub mod persistence;
pub mod subscribers;
