use redb::{Database, ReadableTable};

use crate::constants::{ERR_ORGANIZATION_NOT_FOUND, SEQ_LEDGER};
use crate::db::organizations::{build_detail, detail_in, ensure_exists};
use crate::db::{decode, encode, keys_for, next_id, now, tables};
use crate::error::{AppError, Result};
use crate::models::ledger::validate_stars;
use crate::models::{Account, RatingRecord, RatingRow};

/// Look up the rating row for an (account, organization) pair
pub(crate) fn find_by_account_and_organization<T>(
    ratings: &T,
    account_id: u64,
    organization_id: u64,
) -> Result<Option<RatingRow>>
where
    T: ReadableTable<(u64, u64), &'static [u8]>,
{
    ratings
        .get((account_id, organization_id))?
        .map(|bytes| decode(bytes.value()))
        .transpose()
}

/// Rate an organization with 1..=5 stars
///
/// A second rating for the same pair overwrites the stars of the existing row
/// instead of adding one. The response embeds the organization as the rater
/// sees it in the committing transaction.
pub fn rate(
    db: &Database,
    account: &Account,
    organization_id: u64,
    stars: i64,
) -> Result<RatingRecord> {
    account.require_general_user()?;
    let stars = validate_stars(stars)?;

    let write_txn = db.begin_write()?;
    let (row, organization) = {
        ensure_exists(&write_txn, organization_id)?;

        let mut ratings = write_txn.open_table(tables::RATINGS)?;
        let row = match find_by_account_and_organization(&ratings, account.id, organization_id)? {
            Some(mut existing) => {
                tracing::debug!(
                    "Overwriting rating of organization {} by account {}: {} -> {}",
                    organization_id,
                    account.id,
                    existing.stars,
                    stars
                );
                existing.stars = stars;
                existing.updated_at = now();
                existing
            }
            None => {
                let created_at = now();
                RatingRow {
                    stars,
                    seq: next_id(&write_txn, SEQ_LEDGER)?,
                    created_at,
                    updated_at: created_at,
                }
            }
        };
        ratings.insert((account.id, organization_id), encode(&row)?.as_slice())?;

        let organizations = write_txn.open_table(tables::ORGANIZATIONS)?;
        let index = write_txn.open_table(tables::ORGANIZATION_PRODUCTS)?;
        let favorites = write_txn.open_table(tables::FAVORITES)?;
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

    tracing::info!(
        "Account {} rated organization {} with {} stars",
        account.id,
        organization_id,
        stars
    );

    Ok(RatingRecord::new(organization, &row))
}

/// Remove the account's rating of an organization; a no-op if none exists
pub fn unrate(db: &Database, account: &Account, organization_id: u64) -> Result<()> {
    account.require_general_user()?;

    let write_txn = db.begin_write()?;
    {
        ensure_exists(&write_txn, organization_id)?;

        let mut ratings = write_txn.open_table(tables::RATINGS)?;
        let removed = ratings.remove((account.id, organization_id))?.is_some();
        tracing::debug!(
            "Unrate organization {} by account {} (existed: {})",
            organization_id,
            account.id,
            removed
        );
    }
    write_txn.commit()?;

    Ok(())
}

/// All ratings by the account in creation order, each with an organization snapshot
pub fn list(db: &Database, account: &Account) -> Result<Vec<RatingRecord>> {
    account.require_general_user()?;

    let read_txn = db.begin_read()?;
    let mut rows: Vec<(u64, RatingRow)> = Vec::new();
    {
        let ratings = read_txn.open_table(tables::RATINGS)?;
        for entry in ratings.range(keys_for(account.id))? {
            let (key, value) = entry?;
            rows.push((key.value().1, decode(value.value())?));
        }
    }
    rows.sort_by_key(|(_, row)| row.seq);

    let mut records = Vec::with_capacity(rows.len());
    for (organization_id, row) in &rows {
        if let Some(organization) = detail_in(&read_txn, *organization_id, Some(account.id))? {
            records.push(RatingRecord::new(organization, row));
        }
    }

    Ok(records)
}

/// The viewer's rating of an organization; `None` for anonymous viewers
pub fn rating_for(
    db: &Database,
    organization_id: u64,
    viewer: Option<&Account>,
) -> Result<Option<RatingRecord>> {
    let Some(viewer) = viewer else {
        return Ok(None);
    };

    let read_txn = db.begin_read()?;
    let row = {
        let ratings = read_txn.open_table(tables::RATINGS)?;
        find_by_account_and_organization(&ratings, viewer.id, organization_id)?
    };
    let Some(row) = row else {
        return Ok(None);
    };

    Ok(detail_in(&read_txn, organization_id, Some(viewer.id))?
        .map(|organization| RatingRecord::new(organization, &row)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{business_owner, general_user, organization, test_db};

    fn row_count(db: &Database, account_id: u64) -> usize {
        let read_txn = db.begin_read().unwrap();
        let ratings = read_txn.open_table(tables::RATINGS).unwrap();
        ratings.range(keys_for(account_id)).unwrap().count()
    }

    #[test]
    fn test_rate_embeds_snapshot_with_rating() {
        let (_dir, db) = test_db();
        let user = general_user(&db, "luke@rebels.org");
        let org = organization(&db, "Falcon");

        let record = rate(&db, &user, org, 3).unwrap();

        assert_eq!(record.stars, 3);
        assert_eq!(record.organization_id, org);
        assert_eq!(record.organization.rating, Some(3));
        assert_eq!(record.organization.is_favorited, Some(false));
    }

    #[test]
    fn test_rerate_overwrites_in_place() {
        let (_dir, db) = test_db();
        let user = general_user(&db, "luke@rebels.org");
        let org = organization(&db, "Falcon");

        let first = rate(&db, &user, org, 3).unwrap();
        let second = rate(&db, &user, org, 1).unwrap();

        assert_eq!(second.stars, 1);
        assert_eq!(second.organization.rating, Some(1));
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(row_count(&db, user.id), 1);

        let ratings = list(&db, &user).unwrap();
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0].stars, 1);
    }

    #[test]
    fn test_concurrent_rates_leave_one_row() {
        let (_dir, db) = test_db();
        let user = general_user(&db, "luke@rebels.org");
        let org = organization(&db, "Falcon");
        let submitted: Vec<i64> = (1..=5).collect();

        let records: Vec<RatingRecord> = std::thread::scope(|scope| {
            let handles: Vec<_> = submitted
                .iter()
                .map(|&stars| {
                    let (db, user) = (&db, &user);
                    scope.spawn(move || rate(db, user, org, stars).unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        // Each response agrees with the state its own transaction committed
        for record in &records {
            assert_eq!(record.organization.rating, Some(record.stars));
        }

        assert_eq!(row_count(&db, user.id), 1);
        let stored = list(&db, &user).unwrap();
        assert_eq!(stored.len(), 1);
        assert!(submitted.contains(&i64::from(stored[0].stars)));
    }

    #[test]
    fn test_star_boundaries() {
        let (_dir, db) = test_db();
        let user = general_user(&db, "luke@rebels.org");
        let org = organization(&db, "Falcon");

        assert!(matches!(rate(&db, &user, org, 0), Err(AppError::InvalidInput(_))));
        assert!(matches!(rate(&db, &user, org, 6), Err(AppError::InvalidInput(_))));
        assert_eq!(row_count(&db, user.id), 0);

        assert_eq!(rate(&db, &user, org, 1).unwrap().stars, 1);
        assert_eq!(rate(&db, &user, org, 5).unwrap().stars, 5);
        assert_eq!(row_count(&db, user.id), 1);
    }

    #[test]
    fn test_rate_missing_organization() {
        let (_dir, db) = test_db();
        let user = general_user(&db, "luke@rebels.org");

        assert!(matches!(rate(&db, &user, 404, 3), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_unrate() {
        let (_dir, db) = test_db();
        let user = general_user(&db, "luke@rebels.org");
        let org = organization(&db, "Falcon");

        // No rating yet
        unrate(&db, &user, org).unwrap();

        rate(&db, &user, org, 4).unwrap();
        unrate(&db, &user, org).unwrap();
        assert!(list(&db, &user).unwrap().is_empty());

        assert!(matches!(unrate(&db, &user, 404), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_list_in_creation_order() {
        let (_dir, db) = test_db();
        let user = general_user(&db, "luke@rebels.org");
        let first = organization(&db, "Alpha");
        let second = organization(&db, "Beta");

        rate(&db, &user, second, 2).unwrap();
        rate(&db, &user, first, 4).unwrap();
        // Overwrite keeps its first position
        rate(&db, &user, second, 5).unwrap();

        let ratings = list(&db, &user).unwrap();
        let pairs: Vec<(u64, u8)> = ratings
            .iter()
            .map(|r| (r.organization_id, r.stars))
            .collect();
        assert_eq!(pairs, vec![(second, 5), (first, 4)]);
    }

    #[test]
    fn test_rating_for_viewer() {
        let (_dir, db) = test_db();
        let luke = general_user(&db, "luke@rebels.org");
        let leia = general_user(&db, "leia@rebels.org");
        let org = organization(&db, "Falcon");

        rate(&db, &luke, org, 2).unwrap();

        assert!(rating_for(&db, org, None).unwrap().is_none());
        assert!(rating_for(&db, org, Some(&leia)).unwrap().is_none());
        assert_eq!(
            rating_for(&db, org, Some(&luke)).unwrap().map(|r| r.stars),
            Some(2)
        );
    }

    #[test]
    fn test_business_owner_is_forbidden() {
        let (_dir, db) = test_db();
        let owner = business_owner(&db, "han@smugglers.org");
        let org = organization(&db, "Falcon");

        assert!(matches!(rate(&db, &owner, org, 3), Err(AppError::Forbidden)));
    }
}
