use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;

use crate::db::{organizations, products};
use crate::error::Result;
use crate::models::{
    Organization, OrganizationDetail, OrganizationPage, OrganizationPatch, OrganizationProfile,
    Product,
};
use crate::routes::auth::{authenticate, optional_viewer};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub keyword: Option<String>,
    pub page: Option<usize>,
}

/// Register the caller's organization (business owners only)
///
/// Returns 409 Conflict if the caller already has one.
pub async fn create_organization(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<OrganizationProfile>,
) -> Result<(StatusCode, Json<Organization>)> {
    let owner = authenticate(&state, &headers).await?;
    let db = state.db.clone();

    let organization =
        tokio::task::spawn_blocking(move || organizations::create(&db, &owner, payload)).await??;

    Ok((StatusCode::CREATED, Json(organization)))
}

pub async fn get_own_organization(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Organization>> {
    let owner = authenticate(&state, &headers).await?;
    let db = state.db.clone();

    let organization =
        tokio::task::spawn_blocking(move || organizations::get_own(&db, &owner)).await??;

    Ok(Json(organization))
}

pub async fn update_own_organization(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<OrganizationPatch>,
) -> Result<(StatusCode, Json<Organization>)> {
    let owner = authenticate(&state, &headers).await?;
    let db = state.db.clone();

    let organization =
        tokio::task::spawn_blocking(move || organizations::update_own(&db, &owner, payload))
            .await??;

    Ok((StatusCode::ACCEPTED, Json(organization)))
}

/// Delete the caller's organization along with its products, their reviews
/// and every favorite, rating and history entry pointing at it
pub async fn delete_own_organization(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode> {
    let owner = authenticate(&state, &headers).await?;
    let db = state.db.clone();

    tokio::task::spawn_blocking(move || organizations::delete_own(&db, &owner)).await??;

    Ok(StatusCode::NO_CONTENT)
}

/// Public organization listing, `?keyword=` filter and `?page=` (1-based)
pub async fn list_organizations(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<OrganizationPage>> {
    let db = state.db.clone();
    let page = params.page.unwrap_or(1);

    let listing = tokio::task::spawn_blocking(move || {
        organizations::list(&db, params.keyword.as_deref(), page)
    })
    .await??;

    Ok(Json(listing))
}

/// Organization detail; `isFavorited` and `rating` are null without a token
pub async fn get_organization(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<OrganizationDetail>> {
    let viewer = optional_viewer(&state, &headers).await?;
    let db = state.db.clone();

    let detail =
        tokio::task::spawn_blocking(move || organizations::detail(&db, id, viewer.as_ref()))
            .await??;

    Ok(Json(detail))
}

pub async fn list_organization_products(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<Product>>> {
    let db = state.db.clone();

    let found =
        tokio::task::spawn_blocking(move || products::list_for_organization(&db, id)).await??;

    Ok(Json(found))
}
