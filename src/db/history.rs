use redb::{Database, ReadableTable, Table};

use crate::constants::{ERR_ORGANIZATION_NOT_FOUND, MAX_HISTORY_CAPACITY, SEQ_LEDGER};
use crate::db::organizations::{build_detail, detail_in, ensure_exists};
use crate::db::{decode, encode, keys_for, next_id, now, tables};
use crate::error::{AppError, Result};
use crate::models::{Account, HistoryRecord, HistoryRow};

/// Record that the account viewed an organization
///
/// Every call appends a new entry, repeat views included. After the insert,
/// entries beyond the newest `MAX_HISTORY_CAPACITY` for this account are
/// deleted, all within the same transaction.
pub fn record(db: &Database, account: &Account, organization_id: u64) -> Result<HistoryRecord> {
    account.require_general_user()?;

    let write_txn = db.begin_write()?;
    let (row, organization) = {
        ensure_exists(&write_txn, organization_id)?;

        let seq = next_id(&write_txn, SEQ_LEDGER)?;
        let row = HistoryRow {
            organization_id,
            created_at: now(),
        };

        let mut history = write_txn.open_table(tables::HISTORY)?;
        history.insert((account.id, seq), encode(&row)?.as_slice())?;

        let evicted = evict_beyond_capacity(&mut history, account.id, MAX_HISTORY_CAPACITY)?;
        if evicted > 0 {
            tracing::debug!(
                "Evicted {} history entries for account {}",
                evicted,
                account.id
            );
        }

        let organizations = write_txn.open_table(tables::ORGANIZATIONS)?;
        let index = write_txn.open_table(tables::ORGANIZATION_PRODUCTS)?;
        let favorites = write_txn.open_table(tables::FAVORITES)?;
        let ratings = write_txn.open_table(tables::RATINGS)?;
        let organization = build_detail(
            &organizations,
            &index,
            &favorites,
            &ratings,
            organization_id,
            Some(account.id),
        )?
        .ok_or(AppError::NotFound(ERR_ORGANIZATION_NOT_FOUND))?;
        (row, organization)
    };
    write_txn.commit()?;

    Ok(HistoryRecord::new(organization, &row))
}

/// Delete the oldest entries of an account until at most `capacity` remain
///
/// Returns the number of entries removed.
fn evict_beyond_capacity(
    history: &mut Table<'_, (u64, u64), &'static [u8]>,
    account_id: u64,
    capacity: usize,
) -> Result<usize> {
    // Ascending by seq, i.e. oldest first
    let seqs: Vec<u64> = history
        .range(keys_for(account_id))?
        .map(|entry| entry.map(|(key, _)| key.value().1))
        .collect::<std::result::Result<_, _>>()?;

    let excess = seqs.len().saturating_sub(capacity);
    for seq in &seqs[..excess] {
        history.remove((account_id, *seq))?;
    }

    Ok(excess)
}

/// The account's retained history, newest first
pub fn list(db: &Database, account: &Account) -> Result<Vec<HistoryRecord>> {
    account.require_general_user()?;

    let read_txn = db.begin_read()?;
    let mut rows: Vec<HistoryRow> = Vec::new();
    {
        let history = read_txn.open_table(tables::HISTORY)?;
        for entry in history.range(keys_for(account.id))?.rev() {
            let (_, value) = entry?;
            rows.push(decode(value.value())?);
        }
    }

    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        if let Some(organization) = detail_in(&read_txn, row.organization_id, Some(account.id))? {
            records.push(HistoryRecord::new(organization, row));
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{business_owner, general_user, organization, test_db};

    #[test]
    fn test_record_returns_snapshot() {
        let (_dir, db) = test_db();
        let user = general_user(&db, "luke@rebels.org");
        let org = organization(&db, "Falcon");

        let entry = record(&db, &user, org).unwrap();
        assert_eq!(entry.organization_id, org);
        assert_eq!(entry.organization.organization.profile.name, "Falcon");
        assert_eq!(entry.organization.is_favorited, Some(false));
        assert_eq!(entry.organization.rating, None);
    }

    #[test]
    fn test_record_snapshot_reflects_viewer_ledgers() {
        let (_dir, db) = test_db();
        let user = general_user(&db, "luke@rebels.org");
        let org = organization(&db, "Falcon");
        crate::db::favorites::add(&db, &user, org).unwrap();
        crate::db::ratings::rate(&db, &user, org, 2).unwrap();

        let entry = record(&db, &user, org).unwrap();
        assert_eq!(entry.organization.is_favorited, Some(true));
        assert_eq!(entry.organization.rating, Some(2));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let (_dir, db) = test_db();
        let user = general_user(&db, "luke@rebels.org");
        let orgs: Vec<u64> = (1..=MAX_HISTORY_CAPACITY + 1)
            .map(|i| organization(&db, &format!("Org {}", i)))
            .collect();

        for org in &orgs {
            record(&db, &user, *org).unwrap();
        }

        let history = list(&db, &user).unwrap();
        assert_eq!(history.len(), MAX_HISTORY_CAPACITY);

        // Newest first: O21, O20, ..., O2
        let expected: Vec<u64> = orgs[1..].iter().rev().copied().collect();
        let actual: Vec<u64> = history.iter().map(|h| h.organization_id).collect();
        assert_eq!(actual, expected);
        assert!(!actual.contains(&orgs[0]));
    }

    #[test]
    fn test_repeat_views_count_separately() {
        let (_dir, db) = test_db();
        let user = general_user(&db, "luke@rebels.org");
        let favorite = organization(&db, "Falcon");
        let other = organization(&db, "Cantina");

        record(&db, &user, other).unwrap();
        for _ in 0..MAX_HISTORY_CAPACITY {
            record(&db, &user, favorite).unwrap();
        }

        let history = list(&db, &user).unwrap();
        assert_eq!(history.len(), MAX_HISTORY_CAPACITY);
        assert!(history.iter().all(|h| h.organization_id == favorite));
    }

    #[test]
    fn test_capacity_is_per_account() {
        let (_dir, db) = test_db();
        let luke = general_user(&db, "luke@rebels.org");
        let leia = general_user(&db, "leia@rebels.org");
        let org = organization(&db, "Falcon");

        record(&db, &leia, org).unwrap();
        for _ in 0..MAX_HISTORY_CAPACITY + 5 {
            record(&db, &luke, org).unwrap();
        }

        assert_eq!(list(&db, &luke).unwrap().len(), MAX_HISTORY_CAPACITY);
        assert_eq!(list(&db, &leia).unwrap().len(), 1);
    }

    #[test]
    fn test_record_missing_organization() {
        let (_dir, db) = test_db();
        let user = general_user(&db, "luke@rebels.org");

        assert!(matches!(record(&db, &user, 404), Err(AppError::NotFound(_))));
        assert!(list(&db, &user).unwrap().is_empty());
    }

    #[test]
    fn test_business_owner_is_forbidden() {
        let (_dir, db) = test_db();
        let owner = business_owner(&db, "han@smugglers.org");
        let org = organization(&db, "Falcon");

        assert!(matches!(record(&db, &owner, org), Err(AppError::Forbidden)));
    }
}
