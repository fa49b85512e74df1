use std::collections::HashMap;

use serde_json::json;
use travel_intent::{Intent, IntentType};
use travel_protocol::EventPayload;

/// Builds the `navigation` event the completion task emits once every
/// worker has finished: a route computed from the intent, parameterised by
/// the city and whichever parts actually produced output.
///
/// `city_name` is the human-readable name a client would show/use as a
/// query param (e.g. `"Lisbon"`); `city_id` still drives the URL path
/// itself. When the name is unknown, `city_id` fills in for it so the
/// client still gets something to route on.
pub fn build_navigation(
    intent: &Intent,
    responses: &HashMap<String, String>,
    city_id: &str,
    city_name: &str,
) -> EventPayload {
    let route_type = match intent.intent_type {
        IntentType::Itinerary => "itinerary",
        IntentType::Restaurants => "restaurants",
        IntentType::Hotels => "hotels",
        IntentType::Activities | IntentType::GeneralPoi => "discover",
        IntentType::Chitchat | IntentType::Clarification | IntentType::Cancel => "chat",
    };

    let url = if city_id.is_empty() {
        format!("/{route_type}")
    } else {
        format!("/cities/{city_id}/{route_type}")
    };

    let mut parts: Vec<&String> = responses.keys().collect();
    parts.sort();

    let city = if city_name.is_empty() { city_id } else { city_name };

    EventPayload::Navigation {
        url,
        route_type: route_type.to_string(),
        query_params: json!({
            "city": city,
            "intent": intent.intent_type.to_string(),
            "parts": parts,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn itinerary_intent_routes_to_itinerary_page() {
        let mut responses = HashMap::new();
        responses.insert("itinerary".to_string(), "...".to_string());
        let intent = Intent {
            intent_type: IntentType::Itinerary,
            confidence: 0.9,
            entities: HashMap::new(),
            required_action: None,
        };
        let payload = build_navigation(&intent, &responses, "city-lisbon", "Lisbon");
        match payload {
            EventPayload::Navigation { url, route_type, query_params } => {
                assert_eq!(url, "/cities/city-lisbon/itinerary");
                assert_eq!(route_type, "itinerary");
                assert_eq!(query_params["city"], "Lisbon");
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn unknown_city_name_falls_back_to_the_city_id() {
        let responses = HashMap::new();
        let intent = Intent {
            intent_type: IntentType::GeneralPoi,
            confidence: 0.8,
            entities: HashMap::new(),
            required_action: None,
        };
        let payload = build_navigation(&intent, &responses, "city-porto", "");
        match payload {
            EventPayload::Navigation { query_params, .. } => {
                assert_eq!(query_params["city"], "city-porto");
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }
}
