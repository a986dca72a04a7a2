mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use link_redirects::routes::app_router;
use sqlx::PgPool;
use std::sync::Arc;

#[tokio::test]
async fn test_health_endpoint_success() {
    let (state, _repo, _rx) = common::create_memory_state(common::BASE_URL);
    let server = TestServer::new(app_router(state)).unwrap();

    let response = server.get("/health").await;

    response.assert_status_ok();

    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["checks"]["storage"]["status"], "ok");
    assert_eq!(json["checks"]["event_queue"]["status"], "ok");
    assert_eq!(json["checks"]["cache"]["status"], "ok");
}

#[tokio::test]
async fn test_health_endpoint_structure() {
    let (state, _repo, _rx) = common::create_memory_state(common::BASE_URL);
    let server = TestServer::new(app_router(state)).unwrap();

    let json = server.get("/health").await.json::<serde_json::Value>();

    assert!(json.get("status").is_some());
    assert!(json.get("version").is_some());
    assert!(json["checks"].get("storage").is_some());
    assert!(json["checks"].get("event_queue").is_some());
    assert!(json["checks"].get("cache").is_some());
}

#[tokio::test]
async fn test_health_degraded_when_storage_fails() {
    let (state, _rx) =
        common::create_state_with(Arc::new(common::FailingRepository), common::BASE_URL);
    let server = TestServer::new(app_router(state)).unwrap();

    let response = server.get("/health").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["checks"]["storage"]["status"], "error");
}

#[tokio::test]
async fn test_health_degraded_when_event_queue_closed() {
    let (state, _repo, rx) = common::create_memory_state(common::BASE_URL);
    drop(rx);
    let server = TestServer::new(app_router(state)).unwrap();

    let response = server.get("/health").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["checks"]["event_queue"]["status"], "error");
}

#[sqlx::test]
async fn test_health_with_postgres(pool: PgPool) {
    let (state, _rx) = common::create_pg_state(pool);
    let server = TestServer::new(app_router(state)).unwrap();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["checks"]["storage"]["status"], "ok");
}
