//! Favorite, rating and browsing-history rows.
//!
//! Favorites and ratings are keyed by `(account_id, organization_id)`;
//! history entries by `(account_id, seq)`. `seq` comes from the shared ledger
//! sequence and gives a stable creation order even when timestamps collide.

use serde::{Deserialize, Serialize};

use crate::constants::{ERR_INVALID_STARS, MAX_STARS, MIN_STARS};
use crate::error::{AppError, Result};
use crate::models::organization::OrganizationDetail;
use crate::models::validation::timestamp_to_rfc3339;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteRow {
    pub seq: u64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingRow {
    pub stars: u8,
    pub seq: u64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRow {
    pub organization_id: u64,
    pub created_at: i64,
}

/// Validate a submitted star value, accepting 1..=5 inclusive
pub fn validate_stars(stars: i64) -> Result<u8> {
    match u8::try_from(stars) {
        Ok(value) if (MIN_STARS..=MAX_STARS).contains(&value) => Ok(value),
        _ => Err(AppError::InvalidInput(ERR_INVALID_STARS.to_string())),
    }
}

/// Favorite model for API responses
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRecord {
    pub organization: u64,
    pub created_at: String,
}

impl FavoriteRecord {
    pub fn from_row(organization_id: u64, row: &FavoriteRow) -> Self {
        Self {
            organization: organization_id,
            created_at: timestamp_to_rfc3339(row.created_at),
        }
    }
}

/// Rating model for API responses, embedding the rated organization
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRecord {
    pub organization_id: u64,
    pub stars: u8,
    pub organization: OrganizationDetail,
    pub created_at: String,
    pub updated_at: String,
}

impl RatingRecord {
    pub fn new(organization: OrganizationDetail, row: &RatingRow) -> Self {
        Self {
            organization_id: organization.organization.id,
            stars: row.stars,
            organization,
            created_at: timestamp_to_rfc3339(row.created_at),
            updated_at: timestamp_to_rfc3339(row.updated_at),
        }
    }
}

/// Browsing history model for API responses
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub organization_id: u64,
    pub organization: OrganizationDetail,
    pub created_at: String,
}

impl HistoryRecord {
    pub fn new(organization: OrganizationDetail, row: &HistoryRow) -> Self {
        Self {
            organization_id: row.organization_id,
            organization,
            created_at: timestamp_to_rfc3339(row.created_at),
        }
    }
}
