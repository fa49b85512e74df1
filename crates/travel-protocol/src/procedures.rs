// Well-known procedure names (§6 External Interfaces).

pub const AUTH_REGISTER: &str = "auth.register";
pub const AUTH_LOGIN: &str = "auth.login";
pub const AUTH_REFRESH_TOKEN: &str = "auth.refresh_token";
pub const AUTH_VALIDATE_SESSION: &str = "auth.validate_session";
pub const AUTH_LOGOUT: &str = "auth.logout";

pub const CHAT_STREAM_CHAT: &str = "chat.stream_chat";
pub const CHAT_START_CHAT: &str = "chat.start_chat";

pub const DISCOVER_GET_DISCOVER_PAGE: &str = "discover.get_discover_page";
pub const DISCOVER_GET_TRENDING: &str = "discover.get_trending";
pub const DISCOVER_GET_FEATURED: &str = "discover.get_featured";
pub const DISCOVER_GET_RECENT_DISCOVERIES: &str = "discover.get_recent_discoveries";
pub const DISCOVER_GET_CATEGORY_RESULTS: &str = "discover.get_category_results";

pub const PROFILE_GET_USER_PROFILE_BY_ID: &str = "profile.get_user_profile_by_id";

/// Procedures that skip the auth interceptor stage (§4.2 step 7).
pub const PUBLIC_PROCEDURES: &[&str] = &[
    AUTH_REGISTER,
    AUTH_LOGIN,
    AUTH_REFRESH_TOKEN,
    AUTH_VALIDATE_SESSION,
];

pub fn is_public(procedure: &str) -> bool {
    PUBLIC_PROCEDURES.contains(&procedure)
}
