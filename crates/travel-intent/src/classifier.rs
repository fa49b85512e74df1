use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::types::{Intent, IntentType};

/// Confidence threshold below which a message routes to clarification
/// rather than a guessed domain.
const CONFIDENCE_THRESHOLD: f64 = 0.55;

/// Deterministic, keyword-driven intent classifier.
///
/// Strong keyword matches shortcut straight to a domain with high
/// confidence; anything that doesn't match falls back to a generic
/// low-confidence guess, which the threshold then routes to
/// clarification. No ML model, no network call — this is on the hot
/// path of every turn.
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip(self, message, rolling_summary, recent_messages))]
    pub fn classify(
        &self,
        message: &str,
        rolling_summary: &str,
        recent_messages: &[String],
    ) -> Intent {
        let lower = message.to_lowercase();

        if is_cancel(&lower) {
            debug!("classified as cancel");
            return Intent::cancel();
        }

        if let Some((intent_type, confidence)) = keyword_match(&lower) {
            debug!(%intent_type, confidence, "keyword match");
            return Intent {
                intent_type,
                confidence,
                entities: extract_entities(&lower),
                required_action: None,
            };
        }

        // No strong keyword match. A non-empty rolling summary or recent
        // history nudges confidence up slightly — we're likely continuing
        // an existing thread rather than starting cold.
        let context_bonus = if rolling_summary.is_empty() && recent_messages.is_empty() {
            0.0
        } else {
            0.1
        };
        let confidence = 0.4 + context_bonus;

        if confidence < CONFIDENCE_THRESHOLD {
            debug!(confidence, "below threshold, routing to clarification");
            return Intent::clarification();
        }

        Intent {
            intent_type: IntentType::GeneralPoi,
            confidence,
            entities: extract_entities(&lower),
            required_action: None,
        }
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn is_cancel(lower: &str) -> bool {
    const CANCEL_WORDS: &[&str] = &["cancel", "stop", "never mind", "nevermind"];
    CANCEL_WORDS.iter().any(|w| lower.contains(w))
}

fn keyword_match(lower: &str) -> Option<(IntentType, f64)> {
    const KEYWORDS: &[(&str, IntentType)] = &[
        ("itinerary", IntentType::Itinerary),
        ("plan my trip", IntentType::Itinerary),
        ("day plan", IntentType::Itinerary),
        ("restaurant", IntentType::Restaurants),
        ("where to eat", IntentType::Restaurants),
        ("hotel", IntentType::Hotels),
        ("where to stay", IntentType::Hotels),
        ("accommodation", IntentType::Hotels),
        ("things to do", IntentType::Activities),
        ("activities", IntentType::Activities),
        ("museum", IntentType::GeneralPoi),
        ("landmark", IntentType::GeneralPoi),
        ("hi", IntentType::Chitchat),
        ("hello", IntentType::Chitchat),
        ("thanks", IntentType::Chitchat),
    ];
    KEYWORDS
        .iter()
        .find(|(kw, _)| lower.contains(kw))
        .map(|(_, intent)| (*intent, 0.9))
}

/// Extracts a city name when the message contains an "in <City>" pattern.
/// Deliberately shallow — a real NER model is out of scope for this layer.
fn extract_entities(lower: &str) -> HashMap<String, String> {
    let mut entities = HashMap::new();
    if let Some(idx) = lower.find(" in ") {
        let rest = &lower[idx + 4..];
        let city: String = rest
            .split(|c: char| matches!(c, '.' | ',' | '?' | '!'))
            .next()
            .unwrap_or("")
            .trim()
            .to_string();
        if !city.is_empty() {
            entities.insert("city_name".to_string(), city);
        }
    }
    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn itinerary_keyword_shortcuts_with_high_confidence() {
        let classifier = IntentClassifier::new();
        let intent = classifier.classify("Build me an itinerary in Lisbon", "", &[]);
        assert_eq!(intent.intent_type, IntentType::Itinerary);
        assert!(intent.confidence >= 0.9);
        assert_eq!(intent.entities.get("city_name"), Some(&"lisbon".to_string()));
    }

    #[test]
    fn cancel_keyword_overrides_everything() {
        let classifier = IntentClassifier::new();
        let intent = classifier.classify("actually cancel that itinerary request", "", &[]);
        assert_eq!(intent.intent_type, IntentType::Cancel);
    }

    #[test]
    fn ambiguous_message_with_no_context_routes_to_clarification() {
        let classifier = IntentClassifier::new();
        let intent = classifier.classify("what about tuesday", "", &[]);
        assert_eq!(intent.intent_type, IntentType::Clarification);
    }

    #[test]
    fn ambiguous_message_with_context_is_treated_as_general_poi() {
        let classifier = IntentClassifier::new();
        let intent = classifier.classify(
            "what about something else nearby",
            "user is exploring Lisbon's old town",
            &[],
        );
        assert_eq!(intent.intent_type, IntentType::GeneralPoi);
    }

    #[test]
    fn required_parts_match_the_itinerary_fan_out() {
        assert_eq!(
            IntentType::Itinerary.required_parts(),
            &["city_data", "general_pois", "itinerary"]
        );
    }
}
