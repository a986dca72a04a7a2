//! Fire-and-forget dispatch of redirect events to subscribers.
//!
//! The request path only ever calls [`EventBus::dispatch`], which enqueues the
//! event without waiting. A background worker drains the queue and hands
//! every event to each subscriber on its own task, so a slow or failing
//! subscriber never delays a redirect or another subscriber.
//!
//! At most `concurrency` subscriber tasks run at once. While all permits are
//! taken the worker stops draining, the queue fills up and further events
//! are dropped by [`EventBus::dispatch`].
//!
//! Ordering of events across requests is unspecified.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, warn};

use crate::domain::redirect_event::RedirectEvent;
use crate::error::AppError;

/// Publish side of the domain event bus.
///
/// Implementations must not block and must be safe to call from many
/// in-flight requests at once.
#[cfg_attr(test, mockall::automock)]
pub trait EventBus: Send + Sync {
    /// Hands an event to the bus. Never waits for subscribers.
    fn dispatch(&self, event: RedirectEvent);

    /// Returns true if the bus can still accept events.
    fn is_open(&self) -> bool {
        true
    }
}

/// A consumer of redirect events (analytics, attribution, ...).
#[async_trait]
pub trait RedirectEventSubscriber: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Handles one event. Errors are logged by the worker and dropped.
    async fn handle(&self, event: &RedirectEvent) -> Result<(), AppError>;
}

/// Event bus backed by a bounded channel and a fan-out worker.
#[derive(Clone)]
pub struct DomainEvents {
    sender: mpsc::Sender<RedirectEvent>,
}

impl DomainEvents {
    /// Creates the bus and spawns its worker on the current runtime.
    ///
    /// `capacity` bounds the number of queued events; when the queue is full
    /// new events are dropped. `concurrency` bounds the number of subscriber
    /// tasks running at once.
    pub fn start(
        capacity: usize,
        concurrency: usize,
        subscribers: Vec<Arc<dyn RedirectEventSubscriber>>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        tokio::spawn(run_event_worker(receiver, subscribers, concurrency));
        Self { sender }
    }

    /// Wraps an existing sender; the caller owns the receiving side.
    pub fn from_sender(sender: mpsc::Sender<RedirectEvent>) -> Self {
        Self { sender }
    }

    /// Remaining queue slots.
    pub fn available_capacity(&self) -> usize {
        self.sender.capacity()
    }
}

impl EventBus for DomainEvents {
    fn dispatch(&self, event: RedirectEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                metrics::counter!("link_redirects_events_dropped_total").increment(1);
                warn!("Event queue full, dropping redirect event for {}", event.url);
            }
            Err(TrySendError::Closed(event)) => {
                metrics::counter!("link_redirects_events_dropped_total").increment(1);
                warn!("Event queue closed, dropping redirect event for {}", event.url);
            }
        }
    }

    fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// Drains the event queue until every sender is dropped.
///
/// Each event is delivered to each subscriber on a detached task. A task only
/// starts once it holds one of `concurrency` permits.
pub async fn run_event_worker(
    mut receiver: mpsc::Receiver<RedirectEvent>,
    subscribers: Vec<Arc<dyn RedirectEventSubscriber>>,
    concurrency: usize,
) {
    let concurrency = concurrency.max(1);
    let permits = Arc::new(Semaphore::new(concurrency));

    debug!(
        "Event worker started with {} subscriber(s), concurrency {}",
        subscribers.len(),
        concurrency
    );

    'events: while let Some(event) = receiver.recv().await {
        let event = Arc::new(event);

        for subscriber in &subscribers {
            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                break 'events;
            };
            let subscriber = Arc::clone(subscriber);
            let event = Arc::clone(&event);

            tokio::spawn(async move {
                let _permit = permit;
                if let Err(e) = subscriber.handle(&event).await {
                    error!(
                        subscriber = subscriber.name(),
                        link_redirect_id = %event.link.id,
                        "Redirect event subscriber failed: {}",
                        e
                    );
                }
            });
        }
    }

    debug!("Event worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::LinkRedirect;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use url::Url;

    struct Forward(mpsc::UnboundedSender<RedirectEvent>);

    #[async_trait]
    impl RedirectEventSubscriber for Forward {
        fn name(&self) -> &'static str {
            "forward"
        }

        async fn handle(&self, event: &RedirectEvent) -> Result<(), AppError> {
            let _ = self.0.send(event.clone());
            Ok(())
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl RedirectEventSubscriber for AlwaysFails {
        fn name(&self) -> &'static str {
            "always_fails"
        }

        async fn handle(&self, _event: &RedirectEvent) -> Result<(), AppError> {
            Err(AppError::internal("subscriber down", json!({})))
        }
    }

    /// Counts started handlers and never finishes.
    struct Stalled(Arc<AtomicUsize>);

    #[async_trait]
    impl RedirectEventSubscriber for Stalled {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn handle(&self, _event: &RedirectEvent) -> Result<(), AppError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    fn event(slug: &str) -> RedirectEvent {
        let from = Url::parse(&format!("https://site.example/r/{slug}")).unwrap();
        let link = LinkRedirect::new(
            from.clone(),
            Url::parse("https://destination.example/page").unwrap(),
        );
        RedirectEvent::new(from, link)
    }

    #[tokio::test]
    async fn test_dispatch_reaches_subscriber() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let bus = DomainEvents::start(16, 4, vec![Arc::new(Forward(tx))]);

        bus.dispatch(event("ab12cd34"));

        let received = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received.url.path(), "/r/ab12cd34");
    }

    #[tokio::test]
    async fn test_failing_subscriber_does_not_block_others() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let bus = DomainEvents::start(
            16,
            4,
            vec![Arc::new(AlwaysFails), Arc::new(Forward(tx))],
        );

        bus.dispatch(event("first"));
        bus.dispatch(event("second"));

        let mut paths = Vec::new();
        for _ in 0..2 {
            let received = tokio::time::timeout(Duration::from_secs(1), rx.recv())
                .await
                .unwrap()
                .unwrap();
            paths.push(received.url.path().to_string());
        }
        paths.sort();

        assert_eq!(paths, vec!["/r/first", "/r/second"]);
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let (tx, mut rx) = mpsc::channel(1);
        let bus = DomainEvents::from_sender(tx);

        bus.dispatch(event("kept"));
        bus.dispatch(event("dropped"));

        assert_eq!(rx.try_recv().unwrap().url.path(), "/r/kept");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_queue_reports_closed() {
        let (tx, rx) = mpsc::channel(4);
        let bus = DomainEvents::from_sender(tx);
        assert!(bus.is_open());

        drop(rx);
        bus.dispatch(event("lost"));

        assert!(!bus.is_open());
    }

    #[tokio::test]
    async fn test_stalled_subscriber_holds_work_at_concurrency_limit() {
        let started = Arc::new(AtomicUsize::new(0));
        let bus = DomainEvents::start(8, 3, vec![Arc::new(Stalled(started.clone()))]);

        for round in 0..5 {
            for i in 0..50 {
                bus.dispatch(event(&format!("{round}-{i}")));
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(started.load(Ordering::SeqCst), 3);
        // One event waits on a permit in the worker, the rest fill the queue.
        assert_eq!(bus.available_capacity(), 0);
    }
}
