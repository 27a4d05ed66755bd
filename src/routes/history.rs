use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::db::history;
use crate::error::Result;
use crate::models::HistoryRecord;
use crate::routes::auth::authenticate;
use crate::routes::favorites::OrganizationRef;
use crate::AppState;

/// Record that the caller viewed an organization
///
/// Only the 20 most recent views per account are kept.
pub async fn record_view(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<OrganizationRef>,
) -> Result<(StatusCode, Json<HistoryRecord>)> {
    let account = authenticate(&state, &headers).await?;
    let db = state.db.clone();

    let record = tokio::task::spawn_blocking(move || {
        history::record(&db, &account, payload.organization_id)
    })
    .await??;

    Ok((StatusCode::CREATED, Json(record)))
}

/// Browsing history, newest first
pub async fn list_history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<HistoryRecord>>> {
    let account = authenticate(&state, &headers).await?;
    let db = state.db.clone();

    let records = tokio::task::spawn_blocking(move || history::list(&db, &account)).await??;

    Ok(Json(records))
}
