//! Cache decorator for link redirect lookups.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::domain::entities::{LinkRedirect, lookup_key};
use crate::domain::repositories::{LinkRedirectRepository, RedirectFilter};
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;

/// Serves `get_by_url` from a [`CacheService`] before hitting `inner`.
///
/// # Cache Strategy
///
/// - **Hit**: the cached JSON redirect is returned, `inner` is not queried
/// - **Miss**: `inner` is queried; a found redirect is written to the cache
/// - **Not found**: nothing is cached, so a later registration is visible immediately
/// - **Cache error or bad entry**: logged, falls back to `inner`
///
/// Saves write through to the cache. Filter queries always go to `inner`.
pub struct CachedLinkRedirectRepository<R: LinkRedirectRepository> {
    inner: Arc<R>,
    cache: Arc<dyn CacheService>,
}

impl<R: LinkRedirectRepository> CachedLinkRedirectRepository<R> {
    pub fn new(inner: Arc<R>, cache: Arc<dyn CacheService>) -> Self {
        Self { inner, cache }
    }

    fn cache_key(key: &str) -> String {
        format!("link_redirect:{}", key)
    }

    async fn store(&self, link: &LinkRedirect) {
        match serde_json::to_string(link) {
            Ok(json) => {
                if let Err(e) = self
                    .cache
                    .set(&Self::cache_key(&link.lookup_key()), &json, None)
                    .await
                {
                    warn!("Failed to cache redirect {}: {}", link.from, e);
                }
            }
            Err(e) => warn!("Failed to serialize redirect {}: {}", link.from, e),
        }
    }
}

#[async_trait]
impl<R: LinkRedirectRepository> LinkRedirectRepository for CachedLinkRedirectRepository<R> {
    async fn get_by_url(&self, url: &Url) -> Result<Option<LinkRedirect>, AppError> {
        let key = Self::cache_key(&lookup_key(url));

        match self.cache.get(&key).await {
            Ok(Some(json)) => match serde_json::from_str::<LinkRedirect>(&json) {
                Ok(link) => {
                    debug!("Cache HIT for {}", key);
                    return Ok(Some(link));
                }
                Err(e) => {
                    warn!("Discarding unreadable cache entry {}: {}", key, e);
                    if let Err(e) = self.cache.invalidate(&key).await {
                        warn!("Failed to invalidate cache entry {}: {}", key, e);
                    }
                }
            },
            Ok(None) => debug!("Cache MISS for {}", key),
            Err(e) => warn!("Cache error for {}: {}", key, e),
        }

        let link = self.inner.get_by_url(url).await?;
        if let Some(link) = &link {
            self.store(link).await;
        }

        Ok(link)
    }

    async fn get_all(&self, filter: &RedirectFilter) -> Result<Vec<LinkRedirect>, AppError> {
        self.inner.get_all(filter).await
    }

    async fn get_filtered_ids(&self, filter: &RedirectFilter) -> Result<Vec<Uuid>, AppError> {
        self.inner.get_filtered_ids(filter).await
    }

    async fn save(&self, link: &LinkRedirect) -> Result<(), AppError> {
        self.inner.save(link).await?;
        self.store(link).await;
        Ok(())
    }

    async fn health_check(&self) -> bool {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockLinkRedirectRepository;
    use crate::infrastructure::cache::{CacheError, CacheResult};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MapCache {
        entries: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl CacheService for MapCache {
        async fn get(&self, key: &str) -> CacheResult<Option<String>> {
            Ok(self.entries.lock().await.get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str, _ttl: Option<u64>) -> CacheResult<()> {
            self.entries
                .lock()
                .await
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn invalidate(&self, key: &str) -> CacheResult<()> {
            self.entries.lock().await.remove(key);
            Ok(())
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    struct BrokenCache;

    #[async_trait]
    impl CacheService for BrokenCache {
        async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
            Err(CacheError::OperationError("down".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Option<u64>) -> CacheResult<()> {
            Err(CacheError::OperationError("down".to_string()))
        }

        async fn invalidate(&self, _key: &str) -> CacheResult<()> {
            Ok(())
        }

        async fn health_check(&self) -> bool {
            false
        }
    }

    /// Serves garbage and refuses to drop it.
    #[derive(Default)]
    struct StuckCache {
        invalidations: AtomicUsize,
    }

    #[async_trait]
    impl CacheService for StuckCache {
        async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
            Ok(Some("not json".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Option<u64>) -> CacheResult<()> {
            Ok(())
        }

        async fn invalidate(&self, _key: &str) -> CacheResult<()> {
            self.invalidations.fetch_add(1, Ordering::SeqCst);
            Err(CacheError::OperationError("read only".to_string()))
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    fn link() -> LinkRedirect {
        LinkRedirect::new(
            Url::parse("https://site.example/r/ab12cd34").unwrap(),
            Url::parse("https://destination.example/page").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_second_lookup_is_served_from_cache() {
        let stored = link();
        let returned = stored.clone();

        let mut inner = MockLinkRedirectRepository::new();
        inner
            .expect_get_by_url()
            .times(1)
            .returning(move |_| Ok(Some(returned.clone())));

        let repo = CachedLinkRedirectRepository::new(Arc::new(inner), Arc::new(MapCache::default()));

        let first = repo.get_by_url(&stored.from).await.unwrap();
        let with_query = Url::parse("https://site.example/r/ab12cd34?test").unwrap();
        let second = repo.get_by_url(&with_query).await.unwrap();

        assert_eq!(first, Some(stored.clone()));
        assert_eq!(second, Some(stored));
    }

    #[tokio::test]
    async fn test_misses_are_not_cached() {
        let mut inner = MockLinkRedirectRepository::new();
        inner.expect_get_by_url().times(2).returning(|_| Ok(None));

        let repo = CachedLinkRedirectRepository::new(Arc::new(inner), Arc::new(MapCache::default()));
        let url = Url::parse("https://site.example/r/ffffffff").unwrap();

        assert!(repo.get_by_url(&url).await.unwrap().is_none());
        assert!(repo.get_by_url(&url).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_writes_through() {
        let saved = link();

        let mut inner = MockLinkRedirectRepository::new();
        inner.expect_save().times(1).returning(|_| Ok(()));
        inner.expect_get_by_url().times(0);

        let repo = CachedLinkRedirectRepository::new(Arc::new(inner), Arc::new(MapCache::default()));
        repo.save(&saved).await.unwrap();

        assert_eq!(repo.get_by_url(&saved.from).await.unwrap(), Some(saved));
    }

    #[tokio::test]
    async fn test_failed_save_is_not_cached() {
        let saved = link();

        let mut inner = MockLinkRedirectRepository::new();
        inner
            .expect_save()
            .times(1)
            .returning(|_| Err(AppError::conflict("duplicate", json!({}))));
        inner.expect_get_by_url().times(1).returning(|_| Ok(None));

        let repo = CachedLinkRedirectRepository::new(Arc::new(inner), Arc::new(MapCache::default()));

        assert!(repo.save(&saved).await.unwrap_err().is_conflict());
        assert!(repo.get_by_url(&saved.from).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cache_errors_fall_back_to_inner() {
        let stored = link();
        let returned = stored.clone();

        let mut inner = MockLinkRedirectRepository::new();
        inner
            .expect_get_by_url()
            .times(1)
            .returning(move |_| Ok(Some(returned.clone())));

        let repo = CachedLinkRedirectRepository::new(Arc::new(inner), Arc::new(BrokenCache));

        assert_eq!(repo.get_by_url(&stored.from).await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn test_unreadable_entry_falls_back_to_inner() {
        let stored = link();
        let returned = stored.clone();

        let cache = Arc::new(MapCache::default());
        cache
            .set(
                "link_redirect:https://site.example/r/ab12cd34",
                "not json",
                None,
            )
            .await
            .unwrap();

        let mut inner = MockLinkRedirectRepository::new();
        inner
            .expect_get_by_url()
            .times(1)
            .returning(move |_| Ok(Some(returned.clone())));

        let repo = CachedLinkRedirectRepository::new(Arc::new(inner), cache);

        assert_eq!(repo.get_by_url(&stored.from).await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn test_failed_invalidation_still_falls_back_to_inner() {
        let stored = link();
        let returned = stored.clone();

        let mut inner = MockLinkRedirectRepository::new();
        inner
            .expect_get_by_url()
            .times(2)
            .returning(move |_| Ok(Some(returned.clone())));

        let cache = Arc::new(StuckCache::default());
        let repo = CachedLinkRedirectRepository::new(Arc::new(inner), cache.clone());

        assert_eq!(repo.get_by_url(&stored.from).await.unwrap(), Some(stored.clone()));
        assert_eq!(repo.get_by_url(&stored.from).await.unwrap(), Some(stored));
        assert_eq!(cache.invalidations.load(Ordering::SeqCst), 2);
    }
}
