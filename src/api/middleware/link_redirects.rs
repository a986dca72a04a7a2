//! Short link redirect middleware.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::application::services::RedirectOutcome;
use crate::error::AppError;
use crate::state::AppState;

/// Keeps crawlers from indexing short links.
pub const X_ROBOTS_TAG: HeaderName = HeaderName::from_static("x-robots-tag");

/// Intercepts requests for registered short links.
///
/// Runs in front of every route. Paths outside the redirect prefix, and
/// unknown short links, continue to the next handler untouched.
///
/// # Response
///
/// A hit answers `302 Found` with headers in this order:
///
/// ```text
/// X-Robots-Tag: noindex, nofollow
/// Location: <destination>
/// ```
///
/// # Errors
///
/// Lookup failures are returned as [`AppError`] and rendered by the normal
/// error response path; the request is not forwarded.
///
/// # Integration
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/health", get(health_handler))
///     .layer(middleware::from_fn_with_state(state.clone(), link_redirects::layer));
/// ```
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    match st.redirects.handle_request(req.uri()).await? {
        RedirectOutcome::PassThrough => Ok(next.run(req).await),
        RedirectOutcome::Redirect { link, .. } => {
            let location = HeaderValue::from_str(link.to.as_str()).map_err(|_| {
                AppError::internal(
                    "Redirect target is not a valid header value",
                    json!({ "id": link.id }),
                )
            })?;

            let mut headers = HeaderMap::new();
            headers.insert(X_ROBOTS_TAG, HeaderValue::from_static("noindex, nofollow"));
            headers.insert(header::LOCATION, location);

            Ok((StatusCode::FOUND, headers).into_response())
        }
    }
}
