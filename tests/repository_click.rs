mod common;

use chrono::Utc;
use link_redirects::domain::entities::RedirectClick;
use link_redirects::domain::event_bus::RedirectEventSubscriber;
use link_redirects::domain::redirect_event::RedirectEvent;
use link_redirects::domain::repositories::ClickRepository;
use link_redirects::error::AppError;
use link_redirects::infrastructure::persistence::{PgClickRepository, PgLinkRedirectRepository};
use link_redirects::infrastructure::subscribers::ClickRecorder;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use common::url;

#[sqlx::test]
async fn test_record_and_count(pool: PgPool) {
    let pool = Arc::new(pool);
    let redirects = PgLinkRedirectRepository::new(pool.clone());
    let clicks = PgClickRepository::new(pool);

    let link = common::create_test_redirect(
        &redirects,
        "https://site.example/r/ab12cd34",
        "https://destination.example/page",
    )
    .await;

    let click = RedirectClick {
        link_redirect_id: link.id,
        url: url("https://site.example/r/ab12cd34?utm_source=mail"),
        clicked_at: Utc::now(),
    };
    clicks.record(&click).await.unwrap();
    clicks.record(&click).await.unwrap();

    assert_eq!(clicks.count_for(link.id).await.unwrap(), 2);
    assert_eq!(clicks.count_for(Uuid::new_v4()).await.unwrap(), 0);
}

#[sqlx::test]
async fn test_record_for_unknown_redirect_is_rejected(pool: PgPool) {
    let clicks = PgClickRepository::new(Arc::new(pool));

    let click = RedirectClick {
        link_redirect_id: Uuid::new_v4(),
        url: url("https://site.example/r/ffffffff"),
        clicked_at: Utc::now(),
    };
    let result = clicks.record(&click).await;

    assert!(matches!(result.unwrap_err(), AppError::Validation { .. }));
}

#[sqlx::test]
async fn test_click_recorder_persists_event(pool: PgPool) {
    let pool = Arc::new(pool);
    let redirects = PgLinkRedirectRepository::new(pool.clone());
    let clicks = Arc::new(PgClickRepository::new(pool));

    let link = common::create_test_redirect(
        &redirects,
        "https://site.example/r/ab12cd34",
        "https://destination.example/page",
    )
    .await;

    let recorder = ClickRecorder::new(clicks.clone());
    let event = RedirectEvent::new(url("https://site.example/r/ab12cd34"), link.clone());
    recorder.handle(&event).await.unwrap();

    assert_eq!(clicks.count_for(link.id).await.unwrap(), 1);
}
