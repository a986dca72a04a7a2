//! Handler for requests no route claims.

use axum::http::Uri;
use serde_json::json;

use crate::error::AppError;

/// Answers `404 Not Found` with the standard JSON error body.
///
/// Unknown short links end up here after the redirect middleware passes
/// them through.
pub async fn not_found_handler(uri: Uri) -> AppError {
    AppError::not_found("Not found", json!({ "path": uri.path() }))
}
