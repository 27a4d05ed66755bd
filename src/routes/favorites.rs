use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;

use crate::db::favorites;
use crate::error::Result;
use crate::models::FavoriteRecord;
use crate::routes::auth::authenticate;
use crate::AppState;

/// Body naming the organization a ledger request refers to
#[derive(Debug, Deserialize)]
pub struct OrganizationRef {
    #[serde(rename = "organizationId")]
    pub organization_id: u64,
}

/// Favorite an organization
///
/// Returns 404 if the organization does not exist and 409 Conflict if it
/// is already among the caller's favorites.
pub async fn add_favorite(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<OrganizationRef>,
) -> Result<(StatusCode, Json<FavoriteRecord>)> {
    let account = authenticate(&state, &headers).await?;
    let db = state.db.clone();

    let record = tokio::task::spawn_blocking(move || {
        favorites::add(&db, &account, payload.organization_id)
    })
    .await??;

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_favorites(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<FavoriteRecord>>> {
    let account = authenticate(&state, &headers).await?;
    let db = state.db.clone();

    let records = tokio::task::spawn_blocking(move || favorites::list(&db, &account)).await??;

    Ok(Json(records))
}

/// Unfavorite an organization; succeeds even if it was never favorited
pub async fn remove_favorite(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<OrganizationRef>,
) -> Result<StatusCode> {
    let account = authenticate(&state, &headers).await?;
    let db = state.db.clone();

    tokio::task::spawn_blocking(move || {
        favorites::remove(&db, &account, payload.organization_id)
    })
    .await??;

    Ok(StatusCode::NO_CONTENT)
}
