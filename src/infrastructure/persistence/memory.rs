//! In-memory repositories
//!
//! Contents are lost on shutdown. Used with `STORAGE=memory` and in tests.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::{Mutex, RwLock};
use url::Url;
use uuid::Uuid;

use crate::domain::entities::{LinkRedirect, RedirectClick, lookup_key};
use crate::domain::repositories::{ClickRepository, LinkRedirectRepository, RedirectFilter};
use crate::error::AppError;

/// Link redirects keyed by lookup key.
#[derive(Clone, Debug, Default)]
pub struct MemoryLinkRedirectRepository {
    redirects: Arc<RwLock<HashMap<String, LinkRedirect>>>,
}

impl MemoryLinkRedirectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn matching(&self, filter: &RedirectFilter) -> Vec<LinkRedirect> {
        let mut found: Vec<LinkRedirect> = self
            .redirects
            .read()
            .await
            .values()
            .filter(|link| filter.matches(link))
            .cloned()
            .collect();

        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        found
    }
}

#[async_trait]
impl LinkRedirectRepository for MemoryLinkRedirectRepository {
    async fn get_by_url(&self, url: &Url) -> Result<Option<LinkRedirect>, AppError> {
        Ok(self.redirects.read().await.get(&lookup_key(url)).cloned())
    }

    async fn get_all(&self, filter: &RedirectFilter) -> Result<Vec<LinkRedirect>, AppError> {
        Ok(self.matching(filter).await)
    }

    async fn get_filtered_ids(&self, filter: &RedirectFilter) -> Result<Vec<Uuid>, AppError> {
        Ok(self
            .matching(filter)
            .await
            .into_iter()
            .map(|link| link.id)
            .collect())
    }

    async fn save(&self, link: &LinkRedirect) -> Result<(), AppError> {
        match self.redirects.write().await.entry(link.lookup_key()) {
            Entry::Occupied(_) => Err(AppError::conflict(
                "Redirect already exists",
                json!({ "from": link.from }),
            )),
            Entry::Vacant(slot) => {
                slot.insert(link.clone());
                Ok(())
            }
        }
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// Recorded clicks, in arrival order.
#[derive(Clone, Debug, Default)]
pub struct MemoryClickRepository {
    clicks: Arc<Mutex<Vec<RedirectClick>>>,
}

impl MemoryClickRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded click.
    pub async fn clicks(&self) -> Vec<RedirectClick> {
        self.clicks.lock().await.clone()
    }
}

#[async_trait]
impl ClickRepository for MemoryClickRepository {
    async fn record(&self, click: &RedirectClick) -> Result<(), AppError> {
        self.clicks.lock().await.push(click.clone());
        Ok(())
    }

    async fn count_for(&self, link_redirect_id: Uuid) -> Result<i64, AppError> {
        let count = self
            .clicks
            .lock()
            .await
            .iter()
            .filter(|click| click.link_redirect_id == link_redirect_id)
            .count();

        Ok(count as i64)
    }
}
