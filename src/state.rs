//! Shared application state injected into handlers and middleware.

use std::sync::Arc;

use crate::application::services::LinkRedirectsService;
use crate::domain::event_bus::DomainEvents;
use crate::domain::repositories::LinkRedirectRepository;
use crate::infrastructure::cache::CacheService;

/// Cheap to clone; every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub redirects: Arc<LinkRedirectsService>,
    /// Same repository the service uses; kept for health checks.
    pub repository: Arc<dyn LinkRedirectRepository>,
    pub cache: Arc<dyn CacheService>,
    pub events: DomainEvents,
}

impl AppState {
    pub fn new(
        redirects: Arc<LinkRedirectsService>,
        repository: Arc<dyn LinkRedirectRepository>,
        cache: Arc<dyn CacheService>,
        events: DomainEvents,
    ) -> Self {
        Self {
            redirects,
            repository,
            cache,
            events,
        }
    }
}
