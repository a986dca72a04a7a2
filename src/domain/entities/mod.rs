//! Core domain entities.
//!
//! - [`LinkRedirect`] - A short URL mapped to a destination URL
//! - [`RedirectClick`] - A followed redirect as persisted by the click recorder

pub mod link_redirect;
pub mod redirect_click;

pub use link_redirect::{LinkRedirect, lookup_key};
pub use redirect_click::RedirectClick;
