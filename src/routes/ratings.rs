use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;

use crate::db::ratings;
use crate::error::Result;
use crate::models::RatingRecord;
use crate::routes::auth::authenticate;
use crate::routes::favorites::OrganizationRef;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    #[serde(rename = "organizationId")]
    pub organization_id: u64,
    /// Kept wide so out-of-range values reach validation and get a 400
    pub stars: i64,
}

/// Rate an organization with 1 to 5 stars
///
/// Rating the same organization again replaces the previous stars.
pub async fn rate_organization(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RateRequest>,
) -> Result<(StatusCode, Json<RatingRecord>)> {
    let account = authenticate(&state, &headers).await?;
    let db = state.db.clone();

    let record = tokio::task::spawn_blocking(move || {
        ratings::rate(&db, &account, payload.organization_id, payload.stars)
    })
    .await??;

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_ratings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<RatingRecord>>> {
    let account = authenticate(&state, &headers).await?;
    let db = state.db.clone();

    let records = tokio::task::spawn_blocking(move || ratings::list(&db, &account)).await??;

    Ok(Json(records))
}

pub async fn unrate_organization(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<OrganizationRef>,
) -> Result<StatusCode> {
    let account = authenticate(&state, &headers).await?;
    let db = state.db.clone();

    tokio::task::spawn_blocking(move || {
        ratings::unrate(&db, &account, payload.organization_id)
    })
    .await??;

    Ok(StatusCode::NO_CONTENT)
}
