//! Subscriber that persists redirect clicks.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::debug;

use crate::domain::entities::RedirectClick;
use crate::domain::event_bus::RedirectEventSubscriber;
use crate::domain::redirect_event::RedirectEvent;
use crate::domain::repositories::ClickRepository;
use crate::error::AppError;

/// Retries after the first failed write.
const MAX_RETRIES: usize = 2;

/// Delays before each retry, doubling from `2 * base_delay_ms`.
fn backoff(base_delay_ms: u64) -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(2)
        .factor(base_delay_ms)
        .take(MAX_RETRIES)
}

/// Writes one [`RedirectClick`] per event.
///
/// Storage errors are retried with jittered exponential backoff; validation
/// errors (the redirect was deleted in the meantime) are not.
pub struct ClickRecorder<C: ClickRepository> {
    clicks: Arc<C>,
    base_delay_ms: u64,
}

impl<C: ClickRepository> ClickRecorder<C> {
    pub fn new(clicks: Arc<C>) -> Self {
        Self {
            clicks,
            base_delay_ms: 50,
        }
    }

    /// Overrides the backoff unit; retries wait about 2x then 4x this.
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }
}

#[async_trait]
impl<C: ClickRepository> RedirectEventSubscriber for ClickRecorder<C> {
    fn name(&self) -> &'static str {
        "click_recorder"
    }

    async fn handle(&self, event: &RedirectEvent) -> Result<(), AppError> {
        let click = RedirectClick::from(event);
        let strategy = backoff(self.base_delay_ms).map(jitter);

        RetryIf::spawn(
            strategy,
            || self.clicks.record(&click),
            |e: &AppError| matches!(e, AppError::Internal { .. }),
        )
        .await?;

        debug!(link_redirect_id = %click.link_redirect_id, "Recorded redirect click");
        Ok(())
    }
}
