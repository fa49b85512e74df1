use std::sync::Arc;

use axum::extract::{Extension, State};
use axum::Json;
use travel_protocol::requests::{
    AuthTokens, LoginRequest, LogoutRequest, RefreshTokenRequest, RegisterRequest,
    ValidateSessionRequest, ValidateSessionResponse,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthTokens>, ApiError> {
    let user = state
        .users
        .register(&req.email, &req.display_name, &req.password)
        .map_err(travel_core::Error::from)?;
    let (_, tokens) = state
        .users
        .login(&user.email, &req.password)
        .map_err(travel_core::Error::from)?;
    Ok(Json(AuthTokens {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
    }))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthTokens>, ApiError> {
    let (_, tokens) = state
        .users
        .login(&req.email, &req.password)
        .map_err(travel_core::Error::from)?;
    Ok(Json(AuthTokens {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
    }))
}

pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshTokenRequest>,
) -> Result<Json<AuthTokens>, ApiError> {
    let tokens = state
        .users
        .refresh_token(&req.refresh_token)
        .map_err(travel_core::Error::from)?;
    Ok(Json(AuthTokens {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
    }))
}

pub async fn validate_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ValidateSessionRequest>,
) -> Json<ValidateSessionResponse> {
    match state.users.validate_session(&req.access_token) {
        Ok(user_id) => Json(ValidateSessionResponse {
            valid: true,
            user_id: Some(user_id),
        }),
        Err(_) => Json(ValidateSessionResponse {
            valid: false,
            user_id: None,
        }),
    }
}

/// Requires auth — logout is not in the public procedure list, since
/// revoking a refresh token on behalf of an unauthenticated caller would
/// let anyone log another user out.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(_caller): Extension<AuthUser>,
    Json(req): Json<LogoutRequest>,
) -> Result<(), ApiError> {
    state
        .users
        .logout(&req.refresh_token)
        .map_err(travel_core::Error::from)?;
    Ok(())
}
