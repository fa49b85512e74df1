use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::app::AppState;

/// Token-bucket rate limiting keyed by request path (§4.2 step 4).
///
/// Runs ahead of `auth_layer` so a client that is already over budget
/// never pays the cost of a JWT verification. The bucket is keyed on the
/// path rather than the caller's identity — at this point in the chain
/// the caller hasn't been authenticated yet, so the path is the only
/// cheap, trustworthy key available.
pub async fn rate_limit_layer(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let key = req.uri().path().to_string();
    if state.rate_limiter.check_key(&key).is_err() {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "code": "resource_exhausted",
                "message": "rate limit exceeded",
            })),
        )
            .into_response();
    }
    next.run(req).await
}
