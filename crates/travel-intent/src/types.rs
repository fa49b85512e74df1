use serde::{Deserialize, Serialize};

/// The domain an inbound message is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    Itinerary,
    Restaurants,
    Hotels,
    Activities,
    GeneralPoi,
    Chitchat,
    Clarification,
    /// Explicit "cancel"/"stop" — a no-op action that closes the stream
    /// with a plain `message` event instead of spawning any workers.
    Cancel,
}

impl IntentType {
    /// The ordered set of output parts the fan-out orchestrator must
    /// produce for this intent. Stable across versions — reordering or
    /// renaming a part changes downstream cache fingerprints.
    pub fn required_parts(self) -> &'static [&'static str] {
        match self {
            IntentType::Itinerary => &["city_data", "general_pois", "itinerary"],
            IntentType::Restaurants => &["city_data", "restaurants"],
            IntentType::Hotels => &["city_data", "hotels"],
            IntentType::Activities => &["city_data", "general_pois"],
            IntentType::GeneralPoi => &["general_pois"],
            IntentType::Chitchat => &["message"],
            IntentType::Clarification | IntentType::Cancel => &[],
        }
    }
}

impl std::fmt::Display for IntentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IntentType::Itinerary => "itinerary",
            IntentType::Restaurants => "restaurants",
            IntentType::Hotels => "hotels",
            IntentType::Activities => "activities",
            IntentType::GeneralPoi => "general_poi",
            IntentType::Chitchat => "chitchat",
            IntentType::Clarification => "clarification",
            IntentType::Cancel => "cancel",
        };
        write!(f, "{s}")
    }
}

/// Classification result for one inbound message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    #[serde(rename = "type")]
    pub intent_type: IntentType,
    pub confidence: f64,
    /// Free-form entities extracted from the message (city name, date, etc).
    pub entities: std::collections::HashMap<String, String>,
    /// What the orchestrator should do besides the default fan-out, e.g.
    /// `Some("clarify")` or `Some("cancel")`. `None` for a normal fan-out.
    pub required_action: Option<String>,
}

impl Intent {
    pub fn clarification() -> Self {
        Self {
            intent_type: IntentType::Clarification,
            confidence: 0.0,
            entities: Default::default(),
            required_action: Some("clarify".to_string()),
        }
    }

    pub fn cancel() -> Self {
        Self {
            intent_type: IntentType::Cancel,
            confidence: 1.0,
            entities: Default::default(),
            required_action: Some("cancel".to_string()),
        }
    }
}
