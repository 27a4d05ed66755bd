use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::db::products;
use crate::error::Result;
use crate::models::{Product, ProductDraft};
use crate::routes::auth::authenticate;
use crate::AppState;

/// Add a product to the caller's organization (business owners only)
pub async fn create_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ProductDraft>,
) -> Result<(StatusCode, Json<Product>)> {
    let owner = authenticate(&state, &headers).await?;
    let db = state.db.clone();

    let product =
        tokio::task::spawn_blocking(move || products::create(&db, &owner, payload)).await??;

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn list_own_products(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Product>>> {
    let owner = authenticate(&state, &headers).await?;
    let db = state.db.clone();

    let found = tokio::task::spawn_blocking(move || products::list_own(&db, &owner)).await??;

    Ok(Json(found))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Product>> {
    let db = state.db.clone();

    let product = tokio::task::spawn_blocking(move || products::get(&db, id)).await??;

    Ok(Json(product))
}
