use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use travel_collab::{CityRepository, Poi, PoiRepository};
use travel_protocol::requests::{
    CategoryResultsRequest, DiscoverPageRequest, FeaturedRequest, RecentDiscoveriesRequest, TrendingRequest,
};

use crate::app::AppState;
use crate::error::ApiError;

const DEFAULT_DISCOVERY_LIMIT: usize = 20;

/// Thin pass-through onto the external collaborators (C9) — this crate
/// does not own discovery ranking or pagination, only the wiring.
pub async fn discover_page(
    State(state): State<Arc<AppState>>,
    Query(req): Query<DiscoverPageRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let city_id = resolve_city_id(&state, req.city_name.as_deref()).await?;
    let pois = state
        .collab
        .list_by_city(&city_id, None)
        .await
        .map_err(travel_core::Error::from)?;
    Ok(Json(serde_json::json!({
        "page": req.page.unwrap_or(1),
        "pois": pois,
    })))
}

pub async fn category_results(
    State(state): State<Arc<AppState>>,
    Query(req): Query<CategoryResultsRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let city_id = resolve_city_id(&state, req.city_name.as_deref()).await?;
    let pois = state
        .collab
        .list_by_city(&city_id, Some(&req.category))
        .await
        .map_err(travel_core::Error::from)?;
    Ok(Json(serde_json::json!({ "category": req.category, "pois": pois })))
}

/// `InMemoryCollaborators` (and the `PoiRepository` contract it stands in
/// for) has no trending/featured/recency signal to rank by — the city's
/// whole POI set is the only thing a collaborator can hand back. These
/// three procedures differ from each other only in which slice of that set
/// they surface, not in how they rank it.
pub async fn trending(
    State(state): State<Arc<AppState>>,
    Query(req): Query<TrendingRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let city_id = resolve_city_id(&state, req.city_name.as_deref()).await?;
    let pois = limited(&state, &city_id, req.limit).await?;
    Ok(Json(serde_json::json!({ "pois": pois })))
}

pub async fn featured(
    State(state): State<Arc<AppState>>,
    Query(req): Query<FeaturedRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let city_id = resolve_city_id(&state, req.city_name.as_deref()).await?;
    let pois = limited(&state, &city_id, req.limit).await?;
    Ok(Json(serde_json::json!({ "pois": pois })))
}

pub async fn recent_discoveries(
    State(state): State<Arc<AppState>>,
    Query(req): Query<RecentDiscoveriesRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let city_id = resolve_city_id(&state, req.city_name.as_deref()).await?;
    let pois = limited(&state, &city_id, req.limit).await?;
    Ok(Json(serde_json::json!({ "pois": pois })))
}

async fn limited(state: &AppState, city_id: &str, limit: Option<u32>) -> Result<Vec<Poi>, ApiError> {
    let mut pois = state
        .collab
        .list_by_city(city_id, None)
        .await
        .map_err(travel_core::Error::from)?;
    let limit = limit.map(|l| l as usize).unwrap_or(DEFAULT_DISCOVERY_LIMIT);
    pois.truncate(limit);
    Ok(pois)
}

async fn resolve_city_id(state: &AppState, city_name: Option<&str>) -> Result<String, ApiError> {
    let Some(name) = city_name else {
        return Ok(String::new());
    };
    let city = state
        .collab
        .find_by_name(name)
        .await
        .map_err(travel_core::Error::from)?;
    Ok(city.map(|c| c.id).unwrap_or_default())
}
