use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::accounts;
use crate::error::Result;
use crate::models::{AccountCategory, AccountView};
use crate::routes::auth::authenticate;
use crate::security::issue_token;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    /// 0 = general user, 1 = business owner
    pub category: u8,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub account: AccountView,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub username: String,
}

/// Register a new account
///
/// Returns the account and its bearer token. The token is only ever
/// handed out here; clients must keep it.
///
/// Returns 409 Conflict if the email is already taken.
pub async fn register_account(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let category = AccountCategory::from_code(payload.category);
    let db = state.db.clone();

    let account = tokio::task::spawn_blocking(move || {
        accounts::register(&db, &payload.email, &payload.username, category)
    })
    .await??;

    let token = issue_token(account.id, &state.config.app_secret_key)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            account: account.view(),
            token,
        }),
    ))
}

pub async fn get_me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<AccountView>> {
    let account = authenticate(&state, &headers).await?;
    Ok(Json(account.view()))
}

pub async fn update_me(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<(StatusCode, Json<AccountView>)> {
    let account = authenticate(&state, &headers).await?;
    let db = state.db.clone();

    let updated = tokio::task::spawn_blocking(move || {
        accounts::update_username(&db, &account, &payload.username)
    })
    .await??;

    Ok((StatusCode::ACCEPTED, Json(updated.view())))
}

/// Search accounts by a case-insensitive username fragment
pub async fn search_accounts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<AccountView>>> {
    authenticate(&state, &headers).await?;
    let db = state.db.clone();

    let found = tokio::task::spawn_blocking(move || accounts::search(&db, &params.username)).await??;

    Ok(Json(found.iter().map(|a| a.view()).collect()))
}

pub async fn get_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<AccountView>> {
    authenticate(&state, &headers).await?;
    let db = state.db.clone();

    let account = tokio::task::spawn_blocking(move || accounts::get(&db, id)).await??;

    Ok(Json(account.view()))
}
