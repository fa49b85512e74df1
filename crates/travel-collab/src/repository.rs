use async_trait::async_trait;

use crate::error::Result;
use crate::types::{City, Poi, Profile};

/// Read-only city lookups. Database schema and migrations are an external
/// collaborator's concern; this trait is the whole contract C4/C5 need.
#[async_trait]
pub trait CityRepository: Send + Sync {
    async fn get(&self, city_id: &str) -> Result<Option<City>>;
    async fn find_by_name(&self, name: &str) -> Result<Option<City>>;
}

/// POI lookups, optionally narrowed by category (e.g. `"restaurant"`,
/// `"hotel"`, `"museum"`). Geospatial similarity ranking is out of scope —
/// callers get the candidate set and rank it themselves, if at all.
#[async_trait]
pub trait PoiRepository: Send + Sync {
    async fn list_by_city(&self, city_id: &str, category: Option<&str>) -> Result<Vec<Poi>>;
}

/// Tag vocabulary per city, used to ground prompt entities against known
/// categories rather than free text.
#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn list_for_city(&self, city_id: &str) -> Result<Vec<String>>;
}

/// Travel-profile lookups (distinct from `travel_users::User`, which owns
/// account identity).
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<Profile>>;
}
