use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::db::reviews;
use crate::error::Result;
use crate::models::{Review, ReviewDraft, ReviewPatch};
use crate::routes::auth::authenticate;
use crate::AppState;

pub async fn create_review(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ReviewDraft>,
) -> Result<(StatusCode, Json<Review>)> {
    let author = authenticate(&state, &headers).await?;
    let db = state.db.clone();

    let review =
        tokio::task::spawn_blocking(move || reviews::create(&db, &author, payload)).await??;

    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn list_reviews(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Review>>> {
    let author = authenticate(&state, &headers).await?;
    let db = state.db.clone();

    let found = tokio::task::spawn_blocking(move || reviews::list(&db, &author)).await??;

    Ok(Json(found))
}

/// Reviews by other authors are reported as 404
pub async fn get_review(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Review>> {
    let author = authenticate(&state, &headers).await?;
    let db = state.db.clone();

    let review = tokio::task::spawn_blocking(move || reviews::get(&db, &author, id)).await??;

    Ok(Json(review))
}

pub async fn update_review(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(payload): Json<ReviewPatch>,
) -> Result<(StatusCode, Json<Review>)> {
    let author = authenticate(&state, &headers).await?;
    let db = state.db.clone();

    let review =
        tokio::task::spawn_blocking(move || reviews::update(&db, &author, id, payload)).await??;

    Ok((StatusCode::ACCEPTED, Json(review)))
}

pub async fn delete_review(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<StatusCode> {
    let author = authenticate(&state, &headers).await?;
    let db = state.db.clone();

    tokio::task::spawn_blocking(move || reviews::delete(&db, &author, id)).await??;

    Ok(StatusCode::NO_CONTENT)
}
