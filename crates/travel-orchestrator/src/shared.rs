use std::collections::HashMap;
use std::sync::Mutex;

/// State shared across one request's fan-out workers.
///
/// Both maps are guarded by their own mutex rather than one lock for both,
/// since `part_cache_keys` is written once per worker at start and
/// `responses` is written once per worker at completion — serialising
/// unrelated writers behind a single lock would only add contention.
#[derive(Default)]
pub struct SharedState {
    part_cache_keys: Mutex<HashMap<String, String>>,
    responses: Mutex<HashMap<String, String>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_key(&self, part_type: &str, fingerprint: &str) {
        self.part_cache_keys
            .lock()
            .expect("part_cache_keys mutex poisoned")
            .insert(part_type.to_string(), fingerprint.to_string());
    }

    pub fn record_response(&self, part_type: &str, content: &str) {
        self.responses
            .lock()
            .expect("responses mutex poisoned")
            .insert(part_type.to_string(), content.to_string());
    }

    pub fn snapshot_responses(&self) -> HashMap<String, String> {
        self.responses.lock().expect("responses mutex poisoned").clone()
    }

    pub fn snapshot_cache_keys(&self) -> HashMap<String, String> {
        self.part_cache_keys
            .lock()
            .expect("part_cache_keys mutex poisoned")
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    /// Three workers writing distinct keys to both maps from separate
    /// threads at once: each mutex serialises its own map, so no writer
    /// can observe a torn or missing entry from a sibling.
    #[test]
    fn concurrent_writers_never_lose_an_entry() {
        let shared = Arc::new(SharedState::new());
        let parts = ["city_data", "general_pois", "itinerary"];

        let handles: Vec<_> = parts
            .iter()
            .map(|part| {
                let shared = shared.clone();
                let part = part.to_string();
                thread::spawn(move || {
                    shared.record_cache_key(&part, &format!("fp-{part}"));
                    shared.record_response(&part, &format!("content-{part}"));
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let keys = shared.snapshot_cache_keys();
        let responses = shared.snapshot_responses();
        assert_eq!(keys.len(), 3);
        assert_eq!(responses.len(), 3);
        for part in parts {
            assert_eq!(keys.get(part), Some(&format!("fp-{part}")));
            assert_eq!(responses.get(part), Some(&format!("content-{part}")));
        }
    }
}
