use serde_json::json;
use travel_protocol::EventPayload;

/// Maps a worker's canonical output to the typed terminal event for its
/// part. The LLM is asked to answer in JSON for structured parts; if it
/// didn't, the raw text is wrapped so a malformed model response degrades
/// to a readable payload instead of a dropped event.
pub fn payload_for_part(part_type: &str, content: &str) -> EventPayload {
    let data = serde_json::from_str::<serde_json::Value>(content)
        .unwrap_or_else(|_| json!({ "text": content }));

    match part_type {
        "city_data" => EventPayload::CityData { data },
        "general_pois" => EventPayload::GeneralPoi { data },
        "hotels" => EventPayload::Hotels { data },
        "restaurants" => EventPayload::Restaurants { data },
        "itinerary" => EventPayload::Itinerary { data },
        "message" => EventPayload::Message {
            text: content.to_string(),
        },
        other => EventPayload::GeneralPoi {
            data: json!({ "part_type": other, "text": content }),
        },
    }
}
