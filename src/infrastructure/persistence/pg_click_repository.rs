//! PostgreSQL implementation of the click repository.

use async_trait::async_trait;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::RedirectClick;
use crate::domain::repositories::ClickRepository;
use crate::error::AppError;

/// PostgreSQL repository for recorded redirect clicks.
pub struct PgClickRepository {
    pool: Arc<PgPool>,
}

impl PgClickRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClickRepository for PgClickRepository {
    async fn record(&self, click: &RedirectClick) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO redirect_clicks (link_redirect_id, url, clicked_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(click.link_redirect_id)
        .bind(click.url.as_str())
        .bind(click.clicked_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_foreign_key_violation() => AppError::bad_request(
                "Redirect does not exist",
                json!({ "link_redirect_id": click.link_redirect_id }),
            ),
            _ => AppError::from(e),
        })?;

        Ok(())
    }

    async fn count_for(&self, link_redirect_id: Uuid) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM redirect_clicks WHERE link_redirect_id = $1",
        )
        .bind(link_redirect_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }
}
