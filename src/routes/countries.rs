use axum::Json;
use std::collections::BTreeMap;

use crate::models::organization::countries;

/// Country codes accepted in an organization's location, for client pickers
pub async fn list_countries() -> Json<BTreeMap<&'static str, &'static str>> {
    Json(countries())
}
