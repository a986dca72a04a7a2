//! LinkRedirect entity pairing a short URL with its destination.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// A registered short link.
///
/// `from` is the absolute short URL under the redirect prefix and `to` is the
/// absolute destination. Both are [`Url`]s, so a destination is always fully
/// qualified. Redirects are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRedirect {
    pub id: Uuid,
    pub from: Url,
    pub to: Url,
    pub created_at: DateTime<Utc>,
}

impl LinkRedirect {
    /// Creates a new redirect with a fresh id.
    pub fn new(from: Url, to: Url) -> Self {
        Self {
            id: Uuid::new_v4(),
            from,
            to,
            created_at: Utc::now(),
        }
    }

    /// Rebuilds a redirect from stored fields.
    pub fn from_parts(id: Uuid, from: Url, to: Url, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            from,
            to,
            created_at,
        }
    }

    /// Key under which repositories index this redirect.
    pub fn lookup_key(&self) -> String {
        lookup_key(&self.from)
    }
}

/// Normalizes a short URL into a repository lookup key.
///
/// Query string and fragment are dropped, so `/r/ab12cd34?test` and
/// `/r/ab12cd34` resolve to the same redirect.
pub fn lookup_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.to_string()
}
