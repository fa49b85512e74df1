use sha2::{Digest, Sha256};

/// A committed or in-flight LLM generation, keyed by [`compute_fingerprint`].
///
/// `ttl_secs == 0` means the entry is never read back once committed —
/// every caller still single-flights concurrent producers, but nobody
/// reuses the result after it lands (personalised parts, per the cache
/// config's `personalized_ttl_secs`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedGeneration {
    pub fingerprint: String,
    pub content: String,
    pub content_hash: String,
    pub created_at: i64,
    pub ttl_secs: u64,
}

impl CachedGeneration {
    pub fn new(fingerprint: impl Into<String>, content: String, ttl_secs: u64, created_at: i64) -> Self {
        let content_hash = hash_content(&content);
        Self {
            fingerprint: fingerprint.into(),
            content,
            content_hash,
            created_at,
            ttl_secs,
        }
    }

    pub fn is_fresh(&self, now: i64) -> bool {
        self.ttl_secs > 0 && now - self.created_at < self.ttl_secs as i64
    }
}

pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// `fingerprint = hash(prompt_template_id, user_profile_fingerprint, city_id, part_type, model_id)`.
///
/// Field order is fixed and delimited so two distinct tuples never collide
/// through naive concatenation.
pub fn compute_fingerprint(
    prompt_template_id: &str,
    user_profile_fingerprint: &str,
    city_id: &str,
    part_type: &str,
    model_id: &str,
) -> String {
    let mut hasher = Sha256::new();
    for field in [prompt_template_id, user_profile_fingerprint, city_id, part_type, model_id] {
        hasher.update(field.as_bytes());
        hasher.update(b"\x1f");
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        let a = compute_fingerprint("tpl-itinerary", "up-1", "city-lisbon", "itinerary", "claude-sonnet-4-6");
        let b = compute_fingerprint("tpl-itinerary", "up-1", "city-lisbon", "itinerary", "claude-sonnet-4-6");
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_distinguishes_fields_without_collision() {
        let a = compute_fingerprint("tpl", "ab", "c", "x", "m");
        let b = compute_fingerprint("tpl", "a", "bc", "x", "m");
        assert_ne!(a, b);
    }

    #[test]
    fn zero_ttl_entries_are_never_fresh() {
        let gen = CachedGeneration::new("fp", "hello".into(), 0, 1_000);
        assert!(!gen.is_fresh(1_000));
        assert!(!gen.is_fresh(10_000));
    }

    #[test]
    fn positive_ttl_expires_after_window() {
        let gen = CachedGeneration::new("fp", "hello".into(), 60, 1_000);
        assert!(gen.is_fresh(1_050));
        assert!(!gen.is_fresh(1_100));
    }
}
