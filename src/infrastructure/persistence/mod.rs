//! Repository implementations.
//!
//! - [`PgLinkRedirectRepository`] - PostgreSQL link redirect storage
//! - [`PgClickRepository`] - PostgreSQL click storage
//! - [`MemoryLinkRedirectRepository`], [`MemoryClickRepository`] - In-process storage
//! - [`CachedLinkRedirectRepository`] - Cache decorator for redirect lookups

pub mod cached_link_redirect_repository;
pub mod memory;
pub mod pg_click_repository;
pub mod pg_link_redirect_repository;

pub use cached_link_redirect_repository::CachedLinkRedirectRepository;
pub use memory::{MemoryClickRepository, MemoryLinkRedirectRepository};
pub use pg_click_repository::PgClickRepository;
pub use pg_link_redirect_repository::PgLinkRedirectRepository;
