use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::db::accounts;
use crate::error::{AppError, Result};
use crate::models::Account;
use crate::security::verify_token;
use crate::AppState;

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolve the calling account from its bearer token
///
/// A missing or forged token, or a token for an account that no longer
/// exists, yields 401.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Account> {
    let token = bearer_token(headers).ok_or_else(|| {
        tracing::debug!("Request without bearer token");
        AppError::Unauthorized
    })?;
    let account_id =
        verify_token(token, &state.config.app_secret_key).ok_or(AppError::Unauthorized)?;

    let db = state.db.clone();
    let account = tokio::task::spawn_blocking(move || accounts::get(&db, account_id)).await?;

    account.map_err(|e| match e {
        AppError::NotFound(_) => {
            tracing::warn!("Bearer token for unknown account {}", account_id);
            AppError::Unauthorized
        }
        other => other,
    })
}

/// Like [`authenticate`], but an absent `Authorization` header means an
/// anonymous viewer rather than an error
pub async fn optional_viewer(state: &AppState, headers: &HeaderMap) -> Result<Option<Account>> {
    if !headers.contains_key(AUTHORIZATION) {
        return Ok(None);
    }
    authenticate(state, headers).await.map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer 7.abc"));
        assert_eq!(bearer_token(&headers), Some("7.abc"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
