//! Short link allocation, registration and request-time resolution.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::Uri;
use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::domain::entities::LinkRedirect;
use crate::domain::event_bus::EventBus;
use crate::domain::redirect_event::RedirectEvent;
use crate::domain::repositories::{LinkRedirectRepository, RedirectFilter};
use crate::error::AppError;
use crate::utils::slug::generate_slug;

/// Path segment under which short links live unless configured otherwise.
pub const DEFAULT_REDIRECT_URL_PREFIX: &str = "r/";

/// Query parameter that suppresses event dispatch (used for link previews
/// and tests). The redirect itself still happens.
pub const BYPASS_QUERY_PARAM: &str = "test";

/// Upper bound on slug draws per allocation.
const MAX_SLUG_ATTEMPTS: usize = 10;

/// Settings for [`LinkRedirectsService`].
#[derive(Debug, Clone)]
pub struct LinkRedirectsConfig {
    /// Absolute site URL. A missing trailing `/` is added by the service.
    pub base_url: Url,
    /// Reserved path segment for short links, e.g. `r/`.
    pub redirect_url_prefix: String,
}

impl LinkRedirectsConfig {
    /// Config with the default `r/` prefix.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            redirect_url_prefix: DEFAULT_REDIRECT_URL_PREFIX.to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.redirect_url_prefix = prefix.into();
        self
    }
}

/// Durations measured while resolving one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestTimings {
    /// Time spent in the repository lookup.
    pub lookup: Duration,
    /// Time from entering the handler to the redirect decision.
    pub total: Duration,
}

/// What the HTTP layer should do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    /// Not a short link, or an unknown one: hand the request to the next handler.
    PassThrough,
    /// Redirect to `link.to`.
    Redirect {
        link: LinkRedirect,
        timings: RequestTimings,
    },
}

/// The sole authority for short link allocation, registration and
/// resolution.
///
/// Holds only immutable configuration; the repository and event bus are
/// shared collaborators with their own synchronization.
pub struct LinkRedirectsService {
    repository: Arc<dyn LinkRedirectRepository>,
    events: Arc<dyn EventBus>,
    base_url: Url,
    redirect_url_prefix: String,
    redirect_path_prefix: String,
}

impl LinkRedirectsService {
    /// Creates the service, normalizing the base URL to end in `/`.
    pub fn new(
        repository: Arc<dyn LinkRedirectRepository>,
        events: Arc<dyn EventBus>,
        config: LinkRedirectsConfig,
    ) -> Self {
        let mut base_url = config.base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let redirect_path_prefix = format!("{}{}", base_url.path(), config.redirect_url_prefix);

        Self {
            repository,
            events,
            base_url,
            redirect_url_prefix: config.redirect_url_prefix,
            redirect_path_prefix,
        }
    }

    /// The normalized base URL (always ends in `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Request path prefix that marks a short link, e.g. `/blog/r/`.
    pub fn redirect_path_prefix(&self) -> &str {
        &self.redirect_path_prefix
    }

    /// Returns a short URL that is unused at the time of the check.
    ///
    /// Draws random 8-character hex slugs until the repository reports no
    /// redirect for `{base_url}{prefix}{slug}`. Another caller may register
    /// the same URL between this check and a later save; the storage-level
    /// uniqueness constraint catches that.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] after `MAX_SLUG_ATTEMPTS` collisions,
    /// and propagates repository errors.
    pub async fn get_slug_url(&self) -> Result<Url, AppError> {
        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            let slug = generate_slug()?;
            let url = self
                .base_url
                .join(&format!("{}{}", self.redirect_url_prefix, slug))?;

            if self.repository.get_by_url(&url).await?.is_none() {
                return Ok(url);
            }

            debug!(attempt, "Slug collision for {}", url);
        }

        Err(AppError::internal(
            "Failed to allocate a unique slug",
            json!({ "attempts": MAX_SLUG_ATTEMPTS }),
        ))
    }

    /// Registers a redirect from `from` to `to`.
    ///
    /// `from` is not checked against the redirect prefix; callers normally
    /// obtain it from [`Self::get_slug_url`]. It must not carry a query or
    /// fragment, since lookups match on the bare URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `from` has a query or fragment.
    /// Repository errors propagate unchanged. A duplicate `from` surfaces as
    /// [`AppError::Conflict`] and is not retried here.
    pub async fn add_redirect(&self, from: Url, to: Url) -> Result<LinkRedirect, AppError> {
        if from.query().is_some() || from.fragment().is_some() {
            return Err(AppError::bad_request(
                "Short URL must not contain a query or fragment",
                json!({ "from": from.as_str() }),
            ));
        }

        let link = LinkRedirect::new(from, to);

        self.repository.save(&link).await?;
        info!("Registered redirect {} -> {}", link.from, link.to);

        Ok(link)
    }

    /// Allocates a slug and registers a redirect to `to`.
    ///
    /// If the save loses the allocation race (`Conflict`), a fresh slug is
    /// allocated, up to `MAX_SLUG_ATTEMPTS` times.
    pub async fn create_short_link(&self, to: Url) -> Result<LinkRedirect, AppError> {
        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            let from = self.get_slug_url().await?;

            match self.add_redirect(from, to.clone()).await {
                Err(e) if e.is_conflict() => {
                    warn!(attempt, "Allocated slug was taken before save, retrying");
                }
                result => return result,
            }
        }

        Err(AppError::internal(
            "Failed to register a unique short link",
            json!({ "attempts": MAX_SLUG_ATTEMPTS }),
        ))
    }

    /// Ids of redirects matching the filter.
    pub async fn get_filtered_ids(&self, filter: &RedirectFilter) -> Result<Vec<Uuid>, AppError> {
        self.repository.get_filtered_ids(filter).await
    }

    /// Redirects matching the filter.
    pub async fn get_all(&self, filter: &RedirectFilter) -> Result<Vec<LinkRedirect>, AppError> {
        self.repository.get_all(filter).await
    }

    /// Resolves an inbound request.
    ///
    /// # Request Flow
    ///
    /// 1. Pass through unless the path starts with the redirect path prefix
    /// 2. Parse path and query relative to the base URL
    /// 3. Look the URL up in the repository (timed)
    /// 4. Pass through if nothing matches
    /// 5. Dispatch a [`RedirectEvent`] unless the `test` query parameter is
    ///    present; dispatch never waits
    /// 6. Return the redirect decision
    ///
    /// # Errors
    ///
    /// URL parse failures and repository errors are returned to the caller,
    /// which forwards them to the HTTP error channel.
    pub async fn handle_request(&self, uri: &Uri) -> Result<RedirectOutcome, AppError> {
        let start = Instant::now();
        let mut timings = RequestTimings::default();

        if !uri.path().starts_with(&self.redirect_path_prefix) {
            return Ok(RedirectOutcome::PassThrough);
        }

        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path());
        let url = self.base_url.join(path_and_query)?;

        let lookup_start = Instant::now();
        let link = self.repository.get_by_url(&url).await?;
        timings.lookup = lookup_start.elapsed();
        metrics::histogram!("link_redirects_lookup_seconds").record(timings.lookup.as_secs_f64());

        let Some(link) = link else {
            timings.total = start.elapsed();
            metrics::counter!("link_redirects_pass_through_total").increment(1);
            debug!(
                path = url.path(),
                lookup_ms = ms(timings.lookup),
                total_ms = ms(timings.total),
                "Short link miss"
            );
            return Ok(RedirectOutcome::PassThrough);
        };

        if !url.query_pairs().any(|(key, _)| key == BYPASS_QUERY_PARAM) {
            self.events
                .dispatch(RedirectEvent::new(url.clone(), link.clone()));
        }

        timings.total = start.elapsed();
        metrics::histogram!("link_redirects_request_seconds").record(timings.total.as_secs_f64());
        metrics::counter!("link_redirects_redirected_total").increment(1);
        debug!(
            path = url.path(),
            lookup_ms = ms(timings.lookup),
            total_ms = ms(timings.total),
            "Short link hit"
        );

        Ok(RedirectOutcome::Redirect { link, timings })
    }
}

fn ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
