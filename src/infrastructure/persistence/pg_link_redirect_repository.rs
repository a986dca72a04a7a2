//! PostgreSQL implementation of the link redirect repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

use crate::domain::entities::{LinkRedirect, lookup_key};
use crate::domain::repositories::{LinkRedirectRepository, RedirectFilter};
use crate::error::AppError;

/// PostgreSQL repository for link redirects.
///
/// `from_url` holds the lookup key and carries a `UNIQUE` constraint, which
/// is the final guard against two callers allocating the same slug.
pub struct PgLinkRedirectRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRedirectRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct LinkRedirectRow {
    id: Uuid,
    from_url: String,
    to_url: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<LinkRedirectRow> for LinkRedirect {
    type Error = AppError;

    fn try_from(row: LinkRedirectRow) -> Result<Self, Self::Error> {
        let parse = |value: &str| {
            Url::parse(value).map_err(|e| {
                AppError::internal(
                    "Stored redirect has an invalid URL",
                    json!({ "id": row.id, "reason": e.to_string() }),
                )
            })
        };

        Ok(LinkRedirect::from_parts(
            row.id,
            parse(&row.from_url)?,
            parse(&row.to_url)?,
            row.created_at,
        ))
    }
}

#[async_trait]
impl LinkRedirectRepository for PgLinkRedirectRepository {
    async fn get_by_url(&self, url: &Url) -> Result<Option<LinkRedirect>, AppError> {
        let row = sqlx::query_as::<_, LinkRedirectRow>(
            r#"
            SELECT id, from_url, to_url, created_at
            FROM link_redirects
            WHERE from_url = $1
            "#,
        )
        .bind(lookup_key(url))
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(LinkRedirect::try_from).transpose()
    }

    async fn get_all(&self, filter: &RedirectFilter) -> Result<Vec<LinkRedirect>, AppError> {
        let rows = sqlx::query_as::<_, LinkRedirectRow>(
            r#"
            SELECT id, from_url, to_url, created_at
            FROM link_redirects
            WHERE ($1::text IS NULL OR from_url = $1)
              AND ($2::text IS NULL OR to_url = $2)
              AND ($3::text IS NULL OR strpos(to_url, $3) > 0)
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(filter.from.as_deref())
        .bind(filter.to.as_deref())
        .bind(filter.to_contains.as_deref())
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(LinkRedirect::try_from).collect()
    }

    async fn get_filtered_ids(&self, filter: &RedirectFilter) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM link_redirects
            WHERE ($1::text IS NULL OR from_url = $1)
              AND ($2::text IS NULL OR to_url = $2)
              AND ($3::text IS NULL OR strpos(to_url, $3) > 0)
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(filter.from.as_deref())
        .bind(filter.to.as_deref())
        .bind(filter.to_contains.as_deref())
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(ids)
    }

    async fn save(&self, link: &LinkRedirect) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO link_redirects (id, from_url, to_url, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(link.id)
        // Same as `link.from` for anything registered through the service.
        .bind(link.lookup_key())
        .bind(link.to.as_str())
        .bind(link.created_at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(self.pool.as_ref())
            .await
            .is_ok()
    }
}
