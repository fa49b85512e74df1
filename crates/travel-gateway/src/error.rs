use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Wraps the canonical core error so every handler can just `?` into it and
/// get a consistent `{code, message}` JSON body with the matching status.
pub struct ApiError(pub travel_core::Error);

impl From<travel_core::Error> for ApiError {
    fn from(e: travel_core::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            travel_core::Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            travel_core::Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            travel_core::Error::PermissionDenied(_) => StatusCode::FORBIDDEN,
            travel_core::Error::NotFound(_) => StatusCode::NOT_FOUND,
            travel_core::Error::ResourceExhausted(_) => StatusCode::TOO_MANY_REQUESTS,
            travel_core::Error::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            travel_core::Error::Canceled => StatusCode::from_u16(499).unwrap(),
            travel_core::Error::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            travel_core::Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "code": self.0.code(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
