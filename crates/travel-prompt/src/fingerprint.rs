use sha2::{Digest, Sha256};
use travel_sessions::SessionContext;
use travel_users::User;

/// Stable hash of the parts of a user profile and session context that
/// should invalidate a cached generation when they change: the traveler's
/// id and the working set the prompt builder actually renders from.
/// Anything not fed into [`crate::builder::PromptBuilder::build`] must not
/// be folded in here, or the cache key would churn on irrelevant edits.
pub fn user_profile_fingerprint(user: &User, session_context: &SessionContext) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user.id.as_bytes());
    hasher.update([0x1f]);
    hasher.update(session_context.city_id.as_deref().unwrap_or("").as_bytes());
    hasher.update([0x1f]);
    let mut interests = session_context.active_interests.clone();
    interests.sort();
    hasher.update(interests.join(",").as_bytes());
    hasher.update([0x1f]);
    let mut tags = session_context.active_tags.clone();
    tags.sort();
    hasher.update(tags.join(",").as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use travel_core::types::UserRole;

    fn test_user(id: &str) -> User {
        User {
            id: id.to_string(),
            email: "a@example.com".to_string(),
            display_name: "Ada".to_string(),
            role: UserRole::User,
            password_hash: "x".to_string(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn differing_user_ids_produce_differing_fingerprints() {
        let ctx = SessionContext::default();
        let a = user_profile_fingerprint(&test_user("u1"), &ctx);
        let b = user_profile_fingerprint(&test_user("u2"), &ctx);
        assert_ne!(a, b);
    }

    #[test]
    fn interest_order_does_not_change_the_fingerprint() {
        let user = test_user("u1");
        let mut ctx_a = SessionContext::default();
        ctx_a.active_interests = vec!["art".to_string(), "food".to_string()];
        let mut ctx_b = SessionContext::default();
        ctx_b.active_interests = vec!["food".to_string(), "art".to_string()];
        assert_eq!(
            user_profile_fingerprint(&user, &ctx_a),
            user_profile_fingerprint(&user, &ctx_b)
        );
    }
}
