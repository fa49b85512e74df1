use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use travel_protocol::procedures;

use crate::app::AppState;

/// The authenticated caller, injected into request extensions for
/// handlers to pull out with `Extension<AuthUser>`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// Maps a request path to the procedure name it implements, so the public
/// procedure list (§6) can be checked without hardcoding paths twice.
fn procedure_for_path(path: &str) -> Option<&'static str> {
    match path {
        "/auth/register" => Some(procedures::AUTH_REGISTER),
        "/auth/login" => Some(procedures::AUTH_LOGIN),
        "/auth/refresh" => Some(procedures::AUTH_REFRESH_TOKEN),
        "/auth/validate" => Some(procedures::AUTH_VALIDATE_SESSION),
        "/auth/logout" => Some(procedures::AUTH_LOGOUT),
        "/chat/start" => Some(procedures::CHAT_START_CHAT),
        "/chat/stream" => Some(procedures::CHAT_STREAM_CHAT),
        "/discover/page" => Some(procedures::DISCOVER_GET_DISCOVER_PAGE),
        "/discover/trending" => Some(procedures::DISCOVER_GET_TRENDING),
        "/discover/featured" => Some(procedures::DISCOVER_GET_FEATURED),
        "/discover/recent" => Some(procedures::DISCOVER_GET_RECENT_DISCOVERIES),
        "/discover/category" => Some(procedures::DISCOVER_GET_CATEGORY_RESULTS),
        _ => None,
    }
}

/// Verifies the bearer token on every route it wraps, unary or streaming
/// alike — the same middleware runs ahead of `/chat/stream` as ahead of
/// `/auth/login`, so there is no separate, easier-to-forget check for the
/// streaming path (§4.2 step 7).
pub async fn auth_layer(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let path = req.uri().path();
    if procedure_for_path(path).is_some_and(procedures::is_public) {
        return next.run(req).await;
    }

    let token = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let Some(token) = token else {
        return unauthenticated();
    };

    match state.users.validate_session(token) {
        Ok(user_id) => {
            let mut req = req;
            req.extensions_mut().insert(AuthUser { user_id });
            next.run(req).await
        }
        Err(_) => unauthenticated(),
    }
}

fn unauthenticated() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "code": "unauthenticated",
            "message": "missing or invalid bearer token",
        })),
    )
        .into_response()
}
