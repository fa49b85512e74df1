use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Auth.*
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub display_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidateSessionRequest {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidateSessionResponse {
    pub valid: bool,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

// ---------------------------------------------------------------------------
// Chat.*
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct StreamChatRequest {
    pub session_id: Option<String>,
    pub message: String,
    pub city_name: Option<String>,
    pub user_location: Option<UserLocation>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserLocation {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartChatRequest {
    pub profile_id: String,
    pub city_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartChatResponse {
    pub session_id: String,
}

// ---------------------------------------------------------------------------
// Discover.* — thin pass-through DTOs; the actual content comes from the
// external collaborators (C9) this crate does not specify.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverPageRequest {
    pub city_name: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryResultsRequest {
    pub category: String,
    pub city_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrendingRequest {
    pub city_name: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeaturedRequest {
    pub city_name: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecentDiscoveriesRequest {
    pub city_name: Option<String>,
    pub limit: Option<u32>,
}

// ---------------------------------------------------------------------------
// Profile.*
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct GetUserProfileByIdRequest {
    pub profile_id: String,
}
