//! Domain layer containing entities, events and repository contracts.
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`redirect_event`] - Event emitted when a short link is followed
//! - [`event_bus`] - Fire-and-forget event dispatch and subscriber fan-out
//!
//! The domain layer has no dependencies on infrastructure or presentation
//! layers; the HTTP surface and storage backends depend on it.
//!
//! # Click Processing Flow
//!
//! 1. The redirect middleware resolves a short link
//! 2. A [`redirect_event::RedirectEvent`] is dispatched to the bus (non-blocking)
//! 3. [`event_bus::run_event_worker`] fans it out to subscribers
//! 4. The click recorder persists it via [`repositories::ClickRepository`]

pub mod entities;
pub mod event_bus;
pub mod redirect_event;
pub mod repositories;
