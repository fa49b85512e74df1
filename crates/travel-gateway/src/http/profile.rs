use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use travel_collab::{Profile, ProfileRepository};

use crate::app::AppState;
use crate::error::ApiError;

pub async fn get_user_profile_by_id(
    State(state): State<Arc<AppState>>,
    Path(profile_id): Path<String>,
) -> Result<Json<Profile>, ApiError> {
    let profile = state
        .collab
        .get(&profile_id)
        .await
        .map_err(travel_core::Error::from)?
        .ok_or_else(|| travel_core::Error::NotFound(format!("profile {profile_id}")))?;
    Ok(Json(profile))
}
