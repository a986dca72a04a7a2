//! Repository trait for short link storage and lookup.

use std::str::FromStr;

use async_trait::async_trait;
use serde_json::json;
use url::Url;
use uuid::Uuid;

use crate::domain::entities::LinkRedirect;
use crate::error::AppError;

/// Filter options forwarded by the service to the repository.
///
/// All set fields must match. The default filter matches every redirect.
///
/// A filter can be parsed from a compact expression where terms are joined
/// with `+`:
///
/// ```text
/// from:'https://site.example/r/ab12cd34'
/// to:'https://destination.example/page'+to:~'utm_source'
/// ```
///
/// `key:value` is an exact match, `key:~value` a substring match (only
/// supported on `to`). Values must be quoted when they contain `+`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectFilter {
    /// Exact short URL, compared against the lookup key.
    pub from: Option<String>,
    /// Exact destination URL in its serialized form.
    pub to: Option<String>,
    /// Substring of the destination URL.
    pub to_contains: Option<String>,
}

impl RedirectFilter {
    /// Returns true if the redirect satisfies every set field.
    pub fn matches(&self, link: &LinkRedirect) -> bool {
        self.from.as_ref().is_none_or(|from| link.lookup_key() == *from)
            && self.to.as_ref().is_none_or(|to| link.to.as_str() == to)
            && self
                .to_contains
                .as_ref()
                .is_none_or(|needle| link.to.as_str().contains(needle.as_str()))
    }
}

impl FromStr for RedirectFilter {
    type Err = AppError;

    fn from_str(expr: &str) -> Result<Self, Self::Err> {
        let mut filter = RedirectFilter::default();

        for term in split_terms(expr)? {
            let term = term.trim();
            if term.is_empty() {
                continue;
            }

            let (key, value) = term.split_once(':').ok_or_else(|| invalid_term(term))?;
            let (substring, value) = match value.strip_prefix('~') {
                Some(rest) => (true, rest),
                None => (false, value),
            };
            let value = unquote(value.trim()).ok_or_else(|| invalid_term(term))?;

            match (key.trim(), substring) {
                ("from", false) => filter.from = Some(value),
                ("to", false) => filter.to = Some(value),
                ("to", true) => filter.to_contains = Some(value),
                _ => return Err(invalid_term(term)),
            }
        }

        Ok(filter)
    }
}

fn split_terms(expr: &str) -> Result<Vec<&str>, AppError> {
    let mut terms = Vec::new();
    let mut quoted = false;
    let mut start = 0;

    for (i, c) in expr.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            '+' if !quoted => {
                terms.push(&expr[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if quoted {
        return Err(AppError::bad_request(
            "Unterminated quote in filter",
            json!({ "filter": expr }),
        ));
    }

    terms.push(&expr[start..]);
    Ok(terms)
}

fn unquote(value: &str) -> Option<String> {
    let inner = match value.strip_prefix('\'') {
        Some(rest) => rest.strip_suffix('\'')?,
        None => value,
    };

    (!inner.is_empty()).then(|| inner.to_string())
}

fn invalid_term(term: &str) -> AppError {
    AppError::bad_request("Invalid filter term", json!({ "term": term }))
}

/// Repository interface for link redirects.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRedirectRepository`] - PostgreSQL
/// - [`crate::infrastructure::persistence::MemoryLinkRedirectRepository`] - in-process map
/// - [`crate::infrastructure::persistence::CachedLinkRedirectRepository`] - cache decorator
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRedirectRepository: Send + Sync {
    /// Finds the redirect whose `from` matches `url`.
    ///
    /// Matching uses [`crate::domain::entities::lookup_key`], so the query
    /// string and fragment of `url` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn get_by_url(&self, url: &Url) -> Result<Option<LinkRedirect>, AppError>;

    /// Lists redirects matching the filter, newest first.
    async fn get_all(&self, filter: &RedirectFilter) -> Result<Vec<LinkRedirect>, AppError>;

    /// Lists ids of redirects matching the filter, newest first.
    async fn get_filtered_ids(&self, filter: &RedirectFilter) -> Result<Vec<Uuid>, AppError>;

    /// Persists a new redirect.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if a redirect with the same `from`
    /// already exists. Returns [`AppError::Internal`] on storage errors.
    async fn save(&self, link: &LinkRedirect) -> Result<(), AppError>;

    /// Checks if the storage backend is reachable.
    async fn health_check(&self) -> bool;
}
