//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract for data operations; implementations live in
//! `crate::infrastructure::persistence`. Mock implementations are generated
//! with `mockall` for unit tests.
//!
//! - [`LinkRedirectRepository`] - Short link storage and lookup
//! - [`ClickRepository`] - Recorded redirect clicks

pub mod click_repository;
pub mod link_redirect_repository;

pub use click_repository::ClickRepository;
pub use link_redirect_repository::{LinkRedirectRepository, RedirectFilter};

#[cfg(test)]
pub use click_repository::MockClickRepository;
#[cfg(test)]
pub use link_redirect_repository::MockLinkRedirectRepository;
