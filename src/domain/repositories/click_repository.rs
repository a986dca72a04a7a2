//! Repository trait for recorded redirect clicks.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::RedirectClick;
use crate::error::AppError;

/// Storage for clicks written by the click recorder subscriber.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickRepository: Send + Sync {
    /// Appends a click.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors, or
    /// [`AppError::Validation`] if the redirect no longer exists.
    async fn record(&self, click: &RedirectClick) -> Result<(), AppError>;

    /// Counts clicks recorded for a redirect.
    async fn count_for(&self, link_redirect_id: Uuid) -> Result<i64, AppError>;
}
