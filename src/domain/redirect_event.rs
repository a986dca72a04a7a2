//! Domain event emitted when a short link is followed.

use chrono::{DateTime, Utc};
use url::Url;

use crate::domain::entities::LinkRedirect;

/// A redirect was followed.
///
/// Built fresh for every successful resolution and handed to the
/// [`crate::domain::event_bus::EventBus`] once. The service keeps no reference
/// to it after dispatch; subscribers persist it if they need to.
///
/// # Usage Flow
///
/// 1. Created by [`crate::application::services::LinkRedirectsService::handle_request`]
/// 2. Queued without blocking via [`crate::domain::event_bus::EventBus::dispatch`]
/// 3. Fanned out to subscribers by [`crate::domain::event_bus::run_event_worker`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectEvent {
    /// The short URL that was requested, including its query string.
    pub url: Url,
    /// The redirect that matched.
    pub link: LinkRedirect,
    pub timestamp: DateTime<Utc>,
}

impl RedirectEvent {
    /// Creates an event stamped with the current time.
    pub fn new(url: Url, link: LinkRedirect) -> Self {
        Self {
            url,
            link,
            timestamp: Utc::now(),
        }
    }
}
