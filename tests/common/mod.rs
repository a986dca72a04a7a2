#![allow(dead_code)]

use async_trait::async_trait;
use link_redirects::application::services::{LinkRedirectsConfig, LinkRedirectsService};
use link_redirects::domain::entities::LinkRedirect;
use link_redirects::domain::event_bus::DomainEvents;
use link_redirects::domain::redirect_event::RedirectEvent;
use link_redirects::domain::repositories::{LinkRedirectRepository, RedirectFilter};
use link_redirects::error::AppError;
use link_redirects::infrastructure::cache::NullCache;
use link_redirects::infrastructure::persistence::{
    MemoryLinkRedirectRepository, PgLinkRedirectRepository,
};
use link_redirects::state::AppState;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;
use uuid::Uuid;

pub const BASE_URL: &str = "https://site.example/";

pub fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

/// State over the given repository. Dispatched events land on the returned
/// receiver instead of a worker.
pub fn create_state_with(
    repository: Arc<dyn LinkRedirectRepository>,
    base_url: &str,
) -> (AppState, mpsc::Receiver<RedirectEvent>) {
    let (tx, rx) = mpsc::channel(100);
    let events = DomainEvents::from_sender(tx);

    let redirects = Arc::new(LinkRedirectsService::new(
        repository.clone(),
        Arc::new(events.clone()),
        LinkRedirectsConfig::new(url(base_url)),
    ));

    let state = AppState::new(redirects, repository, Arc::new(NullCache::new()), events);

    (state, rx)
}

pub fn create_memory_state(
    base_url: &str,
) -> (
    AppState,
    Arc<MemoryLinkRedirectRepository>,
    mpsc::Receiver<RedirectEvent>,
) {
    let repository = Arc::new(MemoryLinkRedirectRepository::new());
    let (state, rx) = create_state_with(repository.clone(), base_url);

    (state, repository, rx)
}

pub fn create_pg_state(pool: PgPool) -> (AppState, mpsc::Receiver<RedirectEvent>) {
    let repository = Arc::new(PgLinkRedirectRepository::new(Arc::new(pool)));
    create_state_with(repository, BASE_URL)
}

pub async fn create_test_redirect(
    repository: &dyn LinkRedirectRepository,
    from: &str,
    to: &str,
) -> LinkRedirect {
    let link = LinkRedirect::new(url(from), url(to));
    repository.save(&link).await.unwrap();
    link
}

/// Repository whose every call fails like an unreachable database.
pub struct FailingRepository;

fn storage_down() -> AppError {
    AppError::internal("Database error", json!({ "reason": "connection refused" }))
}

#[async_trait]
impl LinkRedirectRepository for FailingRepository {
    async fn get_by_url(&self, _url: &Url) -> Result<Option<LinkRedirect>, AppError> {
        Err(storage_down())
    }

    async fn get_all(&self, _filter: &RedirectFilter) -> Result<Vec<LinkRedirect>, AppError> {
        Err(storage_down())
    }

    async fn get_filtered_ids(&self, _filter: &RedirectFilter) -> Result<Vec<Uuid>, AppError> {
        Err(storage_down())
    }

    async fn save(&self, _link: &LinkRedirect) -> Result<(), AppError> {
        Err(storage_down())
    }

    async fn health_check(&self) -> bool {
        false
    }
}
