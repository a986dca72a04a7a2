//! Application layer services implementing business logic.
//!
//! Services consume repository and event-bus traits and expose the operations
//! used by the HTTP middleware and the admin CLI.
//!
//! - [`services::link_redirects_service::LinkRedirectsService`] - Slug allocation,
//!   redirect registration and request resolution

pub mod services;
