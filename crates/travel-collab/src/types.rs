use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: String,
    pub name: String,
    pub country: String,
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poi {
    pub id: String,
    pub city_id: String,
    pub name: String,
    pub category: String,
    pub tags: Vec<String>,
}

/// Travel-profile identity (C9-adjacent, owned by `travel-users` for the
/// account-level fields; this crate only sees the travel-specific slice
/// the discovery/profile CRUD surfaces would otherwise own).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub language: String,
    pub content_filter: ContentFilter,
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentFilter {
    Off,
    Moderate,
    Strict,
}
