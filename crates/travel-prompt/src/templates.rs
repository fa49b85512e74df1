//! Stable template catalog.
//!
//! Each function here owns one `template_id`. The id is the cache-relevant
//! identity of a template; the prose it renders can be tuned freely as long
//! as the id is bumped whenever the inputs or intent of the template change,
//! since `travel_cache::compute_fingerprint` takes the id as one of its
//! five inputs and a silent prose change would poison old cache entries
//! with stale output under a still-valid fingerprint.

pub const CITY_DATA_V1: &str = "city_data.v1";
pub const GENERAL_POIS_V1: &str = "general_pois.v1";
pub const ITINERARY_V1: &str = "itinerary.v1";
pub const RESTAURANTS_V1: &str = "restaurants.v1";
pub const HOTELS_V1: &str = "hotels.v1";
pub const MESSAGE_V1: &str = "message.v1";
pub const CLARIFICATION_V1: &str = "clarification.v1";

pub fn template_id_for_part(part_type: &str) -> &'static str {
    match part_type {
        "city_data" => CITY_DATA_V1,
        "general_pois" => GENERAL_POIS_V1,
        "itinerary" => ITINERARY_V1,
        "restaurants" => RESTAURANTS_V1,
        "hotels" => HOTELS_V1,
        "message" => MESSAGE_V1,
        _ => CLARIFICATION_V1,
    }
}
