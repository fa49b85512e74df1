use serde::{Deserialize, Serialize};
use travel_core::types::UserRole;

/// Account record. Stored in SQLite; `password_hash` never leaves this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// UUIDv7 — time-sortable, useful for log correlation.
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// An issued access/refresh token pair.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// Claims embedded in a signed JWT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — the user id.
    pub sub: String,
    /// Token kind, `"access"` or `"refresh"`, so a refresh token can't be
    /// replayed as an access token and vice versa.
    pub kind: String,
    pub iat: i64,
    pub exp: i64,
    /// Unique id for this token; refresh tokens are tracked by `jti` so a
    /// single one can be revoked on logout without invalidating the rest.
    pub jti: String,
}
