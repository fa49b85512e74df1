use serde::{Deserialize, Serialize};

/// The wire unit of a streaming reply (§3 Data Model, `StreamEvent`).
///
/// `event_id` is monotonic per session within one stream; `complete` and
/// `error` are the only payloads that may set `is_final`, and exactly one
/// of them must be the last event on the channel (§4.6).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamEvent {
    pub event_id: u64,
    pub timestamp: String,
    #[serde(flatten)]
    pub payload: EventPayload,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_final: bool,
}

impl StreamEvent {
    pub fn new(event_id: u64, payload: EventPayload) -> Self {
        let is_final = payload.is_terminal();
        Self {
            event_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
            payload,
            is_final,
        }
    }

    /// The part this event belongs to, if any (used by the orchestrator to
    /// track per-worker terminal events and by tests asserting ordering).
    pub fn part_type(&self) -> Option<&str> {
        self.payload.part_type()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    Start,
    Progress {
        message: String,
    },
    DomainDetected {
        intent: String,
        confidence: f64,
    },
    PromptGenerated {
        part_type: String,
    },
    CityData {
        data: serde_json::Value,
    },
    GeneralPoi {
        data: serde_json::Value,
    },
    PersonalizedPoi {
        data: serde_json::Value,
    },
    Hotels {
        data: serde_json::Value,
    },
    Restaurants {
        data: serde_json::Value,
    },
    Itinerary {
        data: serde_json::Value,
    },
    /// Token-level chunk for UI streaming; `part_type` ties it to a worker.
    Chunk {
        part_type: String,
        content: String,
    },
    Message {
        text: String,
    },
    Navigation {
        url: String,
        route_type: String,
        query_params: serde_json::Value,
    },
    /// Per-worker or top-level error. `part_type` is `None` for a top-level
    /// failure that terminates the whole stream.
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        part_type: Option<String>,
        code: String,
        message: String,
    },
    Complete,
}

impl EventPayload {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventPayload::Complete | EventPayload::Error { .. })
    }

    pub fn part_type(&self) -> Option<&str> {
        match self {
            EventPayload::PromptGenerated { part_type } => Some(part_type),
            EventPayload::Chunk { part_type, .. } => Some(part_type),
            EventPayload::Error { part_type, .. } => part_type.as_deref(),
            EventPayload::CityData { .. } => Some("city_data"),
            EventPayload::GeneralPoi { .. } => Some("general_pois"),
            EventPayload::PersonalizedPoi { .. } => Some("personalized_poi"),
            EventPayload::Hotels { .. } => Some("hotels"),
            EventPayload::Restaurants { .. } => Some("restaurants"),
            EventPayload::Itinerary { .. } => Some("itinerary"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let ev = StreamEvent::new(
            3,
            EventPayload::Chunk {
                part_type: "itinerary".into(),
                content: "Day 1: ".into(),
            },
        );
        let json = serde_json::to_string(&ev).unwrap();
        let back: StreamEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(ev, back);
        assert!(!back.is_final);
    }

    #[test]
    fn complete_is_final() {
        let ev = StreamEvent::new(9, EventPayload::Complete);
        assert!(ev.is_final);
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains(r#""is_final":true"#));
    }

    #[test]
    fn start_is_not_final_and_omits_the_field() {
        let ev = StreamEvent::new(0, EventPayload::Start);
        let json = serde_json::to_string(&ev).unwrap();
        assert!(!json.contains("is_final"));
    }

    #[test]
    fn error_carries_part_type_when_scoped_to_a_worker() {
        let ev = StreamEvent::new(
            5,
            EventPayload::Error {
                part_type: Some("hotels".into()),
                code: "unavailable".into(),
                message: "provider timed out".into(),
            },
        );
        assert_eq!(ev.part_type(), Some("hotels"));
        assert!(ev.is_final);
    }
}
