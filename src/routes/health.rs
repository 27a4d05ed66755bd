use axum::{extract::State, Json};
use redb::{Database, ReadableTableMetadata};
use serde_json::{json, Value};

use crate::db::tables;
use crate::error::Result;
use crate::AppState;

/// Liveness of the directory
///
/// Opens a read transaction on the organizations table and reports how many
/// organizations are listed. Any storage failure marks the service unhealthy.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let db = state.db.clone();
    let listed = tokio::task::spawn_blocking(move || count_organizations(&db)).await;

    let (database, organizations) = match listed {
        Ok(Ok(count)) => ("connected", Some(count)),
        Ok(Err(e)) => {
            tracing::error!("Directory health probe failed: {}", e);
            ("disconnected", None)
        }
        Err(e) => {
            tracing::error!("Directory health probe panicked: {}", e);
            ("error", None)
        }
    };

    Json(json!({
        "status": if organizations.is_some() { "healthy" } else { "unhealthy" },
        "database": database,
        "organizations": organizations,
        "environment": state.config.environment,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn count_organizations(db: &Database) -> Result<u64> {
    let read_txn = db.begin_read()?;
    let organizations = read_txn.open_table(tables::ORGANIZATIONS)?;
    Ok(organizations.len()?)
}
