//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET /health`            - Health check: storage, cache, event queue
//! - `{base}{prefix}{slug}`   - Short link redirect (middleware, any method)
//! - everything else          - JSON `404`
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging (outermost)
//! - **Link redirects** - Answers registered short links before routing

use crate::api::handlers::{health_handler, not_found_handler};
use crate::api::middleware::{link_redirects, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};

/// Constructs the application router.
///
/// The redirect middleware wraps the fallback as well, so short links work
/// for any path the router does not know.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .fallback(not_found_handler)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            link_redirects::layer,
        ))
        .with_state(state)
        .layer(tracing::layer())
}
