use redb::{Database, ReadableTable};

use crate::constants::SEQ_LEDGER;
use crate::db::organizations::ensure_exists;
use crate::db::{decode, encode, keys_for, next_id, now, tables};
use crate::error::{AppError, Result};
use crate::models::{Account, FavoriteRecord, FavoriteRow};

/// Favorite an organization
///
/// Returns 404 if the organization does not exist and 409 Conflict if the
/// account already favorited it; the existing row is left untouched.
pub fn add(db: &Database, account: &Account, organization_id: u64) -> Result<FavoriteRecord> {
    account.require_general_user()?;

    let write_txn = db.begin_write()?;
    let row = {
        ensure_exists(&write_txn, organization_id)?;

        let mut favorites = write_txn.open_table(tables::FAVORITES)?;
        if favorites.get((account.id, organization_id))?.is_some() {
            tracing::info!(
                "Account {} already favorited organization {}",
                account.id,
                organization_id
            );
            return Err(AppError::Conflict("Organization is already in favorites"));
        }

        let row = FavoriteRow {
            seq: next_id(&write_txn, SEQ_LEDGER)?,
            created_at: now(),
        };
        favorites.insert((account.id, organization_id), encode(&row)?.as_slice())?;
        row
    };
    write_txn.commit()?;

    tracing::info!(
        "Account {} favorited organization {}",
        account.id,
        organization_id
    );

    Ok(FavoriteRecord::from_row(organization_id, &row))
}

/// Unfavorite an organization; a no-op if it was not favorited
pub fn remove(db: &Database, account: &Account, organization_id: u64) -> Result<()> {
    account.require_general_user()?;

    let write_txn = db.begin_write()?;
    {
        ensure_exists(&write_txn, organization_id)?;

        let mut favorites = write_txn.open_table(tables::FAVORITES)?;
        let removed = favorites.remove((account.id, organization_id))?.is_some();
        tracing::debug!(
            "Unfavorite organization {} by account {} (existed: {})",
            organization_id,
            account.id,
            removed
        );
    }
    write_txn.commit()?;

    Ok(())
}

/// All favorites of the account in insertion order
pub fn list(db: &Database, account: &Account) -> Result<Vec<FavoriteRecord>> {
    account.require_general_user()?;

    let read_txn = db.begin_read()?;
    let favorites = read_txn.open_table(tables::FAVORITES)?;

    let mut rows: Vec<(u64, FavoriteRow)> = Vec::new();
    for entry in favorites.range(keys_for(account.id))? {
        let (key, value) = entry?;
        rows.push((key.value().1, decode(value.value())?));
    }
    rows.sort_by_key(|(_, row)| row.seq);

    Ok(rows
        .iter()
        .map(|(organization_id, row)| FavoriteRecord::from_row(*organization_id, row))
        .collect())
}
