//! Helper functions shared across layers.
//!
//! - [`slug`] - Random slug generation for short links

pub mod slug;
