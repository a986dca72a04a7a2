//! Redirect event subscribers.
//!
//! - [`ClickRecorder`] - Persists every followed redirect as a click row

pub mod click_recorder;

pub use click_recorder::ClickRecorder;
