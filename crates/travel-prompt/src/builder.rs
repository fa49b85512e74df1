use tracing::instrument;
use travel_intent::{Intent, IntentType};
use travel_sessions::SessionContext;
use travel_users::User;

use crate::templates::template_id_for_part;
use crate::types::PartPrompt;

const BASE_PERSONA: &str = "You are a travel discovery assistant. You answer with concrete, \
    groundable recommendations and never invent POIs, addresses, or prices you aren't given.";

/// Builds one [`PartPrompt`] per part required by an intent.
///
/// Stateless by design: every input it needs is passed in per call, so the
/// same builder instance is safely shared across concurrently-streaming
/// requests.
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Render the prompts for one classified turn.
    ///
    /// `Cancel` has no parts — the caller is expected to short-circuit
    /// before ever reaching the LLM. `Clarification` renders exactly one
    /// `message` part asking the user to narrow their request.
    #[instrument(skip(self, intent, session_context, user))]
    pub fn build(
        &self,
        intent: &Intent,
        session_context: &SessionContext,
        user: &User,
    ) -> Vec<PartPrompt> {
        if intent.intent_type == IntentType::Clarification {
            return vec![self.clarification_prompt(session_context)];
        }

        intent
            .intent_type
            .required_parts()
            .iter()
            .map(|part_type| self.build_part(part_type, intent, session_context, user))
            .collect()
    }

    fn build_part(
        &self,
        part_type: &str,
        intent: &Intent,
        session_context: &SessionContext,
        user: &User,
    ) -> PartPrompt {
        let system = format!(
            "{BASE_PERSONA} Respond only with content relevant to the `{part_type}` section \
             of the answer.",
        );

        let city = session_context
            .city_id
            .as_deref()
            .unwrap_or("an unspecified city");

        let interests = if session_context.active_interests.is_empty() {
            "no stated interests yet".to_string()
        } else {
            session_context.active_interests.join(", ")
        };

        let entities = if intent.entities.is_empty() {
            String::new()
        } else {
            let pairs: Vec<String> = intent
                .entities
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            format!(" Extracted entities: {}.", pairs.join(", "))
        };

        let user_message = format!(
            "Part: {part_type}\nCity: {city}\nTraveler: {} ({})\nInterests: {interests}\n\
             Conversation so far: {}{entities}",
            user.display_name,
            user.id,
            if session_context.rolling_summary.is_empty() {
                "none yet"
            } else {
                &session_context.rolling_summary
            },
        );

        PartPrompt {
            part_type: part_type.to_string(),
            template_id: template_id_for_part(part_type).to_string(),
            system,
            user_message,
        }
    }

    fn clarification_prompt(&self, session_context: &SessionContext) -> PartPrompt {
        let system = format!(
            "{BASE_PERSONA} The user's request is ambiguous. Ask exactly one concise \
             clarifying question that would let you proceed."
        );
        let user_message = if session_context.rolling_summary.is_empty() {
            "The user's request so far is unclear. Ask for the missing detail.".to_string()
        } else {
            format!(
                "Conversation so far: {}\nThe latest request is unclear. Ask for the missing detail.",
                session_context.rolling_summary
            )
        };
        PartPrompt {
            part_type: "message".to_string(),
            template_id: template_id_for_part("clarification").to_string(),
            system,
            user_message,
        }
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use travel_core::types::UserRole;

    fn test_user() -> User {
        User {
            id: "user-1".to_string(),
            email: "a@example.com".to_string(),
            display_name: "Ada".to_string(),
            role: UserRole::User,
            password_hash: "x".to_string(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn itinerary_intent_yields_one_prompt_per_required_part() {
        let builder = PromptBuilder::new();
        let intent = Intent {
            intent_type: IntentType::Itinerary,
            confidence: 0.9,
            entities: HashMap::new(),
            required_action: None,
        };
        let ctx = SessionContext::default();
        let prompts = builder.build(&intent, &ctx, &test_user());
        let parts: Vec<&str> = prompts.iter().map(|p| p.part_type.as_str()).collect();
        assert_eq!(parts, vec!["city_data", "general_pois", "itinerary"]);
    }

    #[test]
    fn clarification_intent_yields_a_single_message_prompt() {
        let builder = PromptBuilder::new();
        let prompts = builder.build(&Intent::clarification(), &SessionContext::default(), &test_user());
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].part_type, "message");
        assert_eq!(prompts[0].template_id, "clarification.v1");
    }

    #[test]
    fn same_template_id_is_stable_across_calls() {
        let builder = PromptBuilder::new();
        let intent = Intent {
            intent_type: IntentType::Restaurants,
            confidence: 0.9,
            entities: HashMap::new(),
            required_action: None,
        };
        let ctx = SessionContext::default();
        let first = builder.build(&intent, &ctx, &test_user());
        let second = builder.build(&intent, &ctx, &test_user());
        assert_eq!(
            first.iter().map(|p| &p.template_id).collect::<Vec<_>>(),
            second.iter().map(|p| &p.template_id).collect::<Vec<_>>()
        );
    }
}
