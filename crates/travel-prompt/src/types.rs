use serde::{Deserialize, Serialize};

/// One rendered prompt for a single fan-out part (`city_data`, `itinerary`, ...).
///
/// `template_id` is stable across content changes to the surrounding prose —
/// it, not the rendered text, is what feeds the cache fingerprint, so the
/// template catalog in [`crate::templates`] must only ever bump an id when
/// the template's inputs or shape actually change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartPrompt {
    pub part_type: String,
    pub template_id: String,
    pub system: String,
    pub user_message: String,
}
