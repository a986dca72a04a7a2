//! Persisted record of a followed redirect.

use chrono::{DateTime, Utc};
use url::Url;
use uuid::Uuid;

use crate::domain::redirect_event::RedirectEvent;

/// A click row written by the click recorder subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectClick {
    pub link_redirect_id: Uuid,
    pub url: Url,
    pub clicked_at: DateTime<Utc>,
}

impl From<&RedirectEvent> for RedirectClick {
    fn from(event: &RedirectEvent) -> Self {
        Self {
            link_redirect_id: event.link.id,
            url: event.url.clone(),
            clicked_at: event.timestamp,
        }
    }
}
