use redb::{Database, ReadTransaction, ReadableTable, WriteTransaction};
use std::collections::HashSet;

use crate::constants::{
    ERR_INVALID_PAGE, ERR_NO_OWN_ORGANIZATION, ERR_ORGANIZATION_NOT_FOUND, PAGE_SIZE,
    SEQ_ORGANIZATIONS,
};
use crate::db::{decode, encode, keys_for, next_id, now, tables};
use crate::error::{AppError, Result};
use crate::models::ledger::HistoryRow;
use crate::models::validation::current_year;
use crate::models::{
    Account, Organization, OrganizationDetail, OrganizationPage, OrganizationPatch,
    OrganizationProfile, OrganizationRecord, ReviewRecord,
};

/// Create the business owner's organization
///
/// Returns 409 Conflict if the owner already has one.
pub fn create(
    db: &Database,
    owner: &Account,
    mut profile: OrganizationProfile,
) -> Result<Organization> {
    owner.require_business_owner()?;
    profile.normalize();
    profile
        .validate(current_year())
        .map_err(AppError::InvalidInput)?;

    let write_txn = db.begin_write()?;
    let (id, record) = {
        let mut owners = write_txn.open_table(tables::OWNER_ORGANIZATIONS)?;
        if owners.get(owner.id)?.is_some() {
            tracing::info!("Account {} already owns an organization", owner.id);
            return Err(AppError::Conflict("Account already owns an organization"));
        }

        let id = next_id(&write_txn, SEQ_ORGANIZATIONS)?;
        let created_at = now();
        let record = OrganizationRecord {
            owner_id: owner.id,
            profile,
            created_at,
            updated_at: created_at,
        };

        let mut organizations = write_txn.open_table(tables::ORGANIZATIONS)?;
        organizations.insert(id, encode(&record)?.as_slice())?;
        owners.insert(owner.id, id)?;
        (id, record)
    };
    write_txn.commit()?;

    tracing::info!("Organization {} created by account {}", id, owner.id);

    Ok(Organization::from_record(id, record))
}

/// The business owner's own organization
pub fn get_own(db: &Database, owner: &Account) -> Result<Organization> {
    owner.require_business_owner()?;

    let read_txn = db.begin_read()?;
    let owners = read_txn.open_table(tables::OWNER_ORGANIZATIONS)?;
    let id = owners
        .get(owner.id)?
        .map(|v| v.value())
        .ok_or(AppError::NotFound(ERR_NO_OWN_ORGANIZATION))?;

    let organizations = read_txn.open_table(tables::ORGANIZATIONS)?;
    let record: OrganizationRecord = organizations
        .get(id)?
        .map(|bytes| decode(bytes.value()))
        .transpose()?
        .ok_or(AppError::NotFound(ERR_NO_OWN_ORGANIZATION))?;

    Ok(Organization::from_record(id, record))
}

/// Apply a partial update to the business owner's organization
pub fn update_own(db: &Database, owner: &Account, patch: OrganizationPatch) -> Result<Organization> {
    owner.require_business_owner()?;

    let write_txn = db.begin_write()?;
    let (id, record) = {
        let owners = write_txn.open_table(tables::OWNER_ORGANIZATIONS)?;
        let id = owners
            .get(owner.id)?
            .map(|v| v.value())
            .ok_or(AppError::NotFound(ERR_NO_OWN_ORGANIZATION))?;

        let mut organizations = write_txn.open_table(tables::ORGANIZATIONS)?;
        let mut record: OrganizationRecord = organizations
            .get(id)?
            .map(|bytes| decode(bytes.value()))
            .transpose()?
            .ok_or(AppError::NotFound(ERR_NO_OWN_ORGANIZATION))?;

        patch.apply(&mut record.profile);
        record.profile.normalize();
        record
            .profile
            .validate(current_year())
            .map_err(AppError::InvalidInput)?;
        record.updated_at = now();

        organizations.insert(id, encode(&record)?.as_slice())?;
        (id, record)
    };
    write_txn.commit()?;

    tracing::info!("Organization {} updated", id);

    Ok(Organization::from_record(id, record))
}

/// Delete the business owner's organization and everything that refers to it
pub fn delete_own(db: &Database, owner: &Account) -> Result<()> {
    owner.require_business_owner()?;

    let write_txn = db.begin_write()?;
    let id = {
        let mut owners = write_txn.open_table(tables::OWNER_ORGANIZATIONS)?;
        let removed = owners.remove(owner.id)?.map(|v| v.value());
        removed.ok_or(AppError::NotFound(ERR_NO_OWN_ORGANIZATION))?
    };
    remove_cascading(&write_txn, id)?;
    write_txn.commit()?;

    tracing::info!("Organization {} deleted by account {}", id, owner.id);

    Ok(())
}

/// Public listing, optionally filtered by keyword, paginated by `PAGE_SIZE`
pub fn list(db: &Database, keyword: Option<&str>, page: usize) -> Result<OrganizationPage> {
    if page == 0 {
        return Err(AppError::InvalidInput(ERR_INVALID_PAGE.to_string()));
    }
    let keyword = keyword.map(str::trim).filter(|k| !k.is_empty());

    let read_txn = db.begin_read()?;
    let organizations = read_txn.open_table(tables::ORGANIZATIONS)?;

    let mut matching = Vec::new();
    for entry in organizations.iter()? {
        let (key, value) = entry?;
        let record: OrganizationRecord = decode(value.value())?;
        if keyword.map_or(true, |k| record.profile.matches_keyword(k)) {
            matching.push(Organization::from_record(key.value(), record));
        }
    }

    let count = matching.len();
    let start = match (page - 1).checked_mul(PAGE_SIZE) {
        Some(start) if page == 1 || start < count => start,
        _ => return Err(AppError::NotFound(ERR_INVALID_PAGE)),
    };

    let results = matching.into_iter().skip(start).take(PAGE_SIZE).collect();

    Ok(OrganizationPage {
        count,
        page,
        results,
    })
}

/// Organization detail as seen by `viewer` (anonymous when `None`)
pub fn detail(
    db: &Database,
    organization_id: u64,
    viewer: Option<&Account>,
) -> Result<OrganizationDetail> {
    let read_txn = db.begin_read()?;
    detail_in(&read_txn, organization_id, viewer.map(|a| a.id))?
        .ok_or(AppError::NotFound(ERR_ORGANIZATION_NOT_FOUND))
}

/// Build an organization snapshot inside an existing read transaction
pub(crate) fn detail_in(
    txn: &ReadTransaction,
    organization_id: u64,
    viewer_id: Option<u64>,
) -> Result<Option<OrganizationDetail>> {
    let organizations = txn.open_table(tables::ORGANIZATIONS)?;
    let index = txn.open_table(tables::ORGANIZATION_PRODUCTS)?;
    let favorites = txn.open_table(tables::FAVORITES)?;
    let ratings = txn.open_table(tables::RATINGS)?;

    build_detail(
        &organizations,
        &index,
        &favorites,
        &ratings,
        organization_id,
        viewer_id,
    )
}

/// Build an organization snapshot from already opened tables
///
/// Works on read-only and writable tables alike, so a write transaction can
/// return the state it is about to commit.
pub(crate) fn build_detail<O, I, F, R>(
    organizations: &O,
    index: &I,
    favorites: &F,
    ratings: &R,
    organization_id: u64,
    viewer_id: Option<u64>,
) -> Result<Option<OrganizationDetail>>
where
    O: ReadableTable<u64, &'static [u8]>,
    I: ReadableTable<(u64, u64), ()>,
    F: ReadableTable<(u64, u64), &'static [u8]>,
    R: ReadableTable<(u64, u64), &'static [u8]>,
{
    let record: OrganizationRecord = match organizations.get(organization_id)? {
        Some(bytes) => decode(bytes.value())?,
        None => return Ok(None),
    };

    let mut products = Vec::new();
    for entry in index.range(keys_for(organization_id))? {
        let (key, _) = entry?;
        products.push(key.value().1);
    }

    let (is_favorited, rating) = match viewer_id {
        Some(account_id) => {
            let is_favorited = favorites.get((account_id, organization_id))?.is_some();
            let rating = crate::db::ratings::find_by_account_and_organization(
                ratings,
                account_id,
                organization_id,
            )?
            .map(|row| row.stars);
            (Some(is_favorited), rating)
        }
        None => (None, None),
    };

    Ok(Some(OrganizationDetail {
        organization: Organization::from_record(organization_id, record),
        products,
        is_favorited,
        rating,
    }))
}

/// Fail with 404 unless the organization exists
///
/// Must not be called while the caller holds `ORGANIZATIONS` open.
pub(crate) fn ensure_exists(txn: &WriteTransaction, organization_id: u64) -> Result<()> {
    let organizations = txn.open_table(tables::ORGANIZATIONS)?;
    if organizations.get(organization_id)?.is_none() {
        tracing::warn!("Reference to non-existent organization {}", organization_id);
        return Err(AppError::NotFound(ERR_ORGANIZATION_NOT_FOUND));
    }
    Ok(())
}

/// Remove an organization with its products, their reviews, and every
/// favorite, rating and history row that points at it
fn remove_cascading(txn: &WriteTransaction, organization_id: u64) -> Result<()> {
    let mut organizations = txn.open_table(tables::ORGANIZATIONS)?;
    organizations.remove(organization_id)?;
    drop(organizations);

    // Products and the product index
    let mut index = txn.open_table(tables::ORGANIZATION_PRODUCTS)?;
    let product_ids: HashSet<u64> = index
        .range(keys_for(organization_id))?
        .map(|entry| entry.map(|(key, _)| key.value().1))
        .collect::<std::result::Result<_, _>>()?;
    let mut products = txn.open_table(tables::PRODUCTS)?;
    for product_id in &product_ids {
        index.remove((organization_id, *product_id))?;
        products.remove(*product_id)?;
    }
    drop(products);
    drop(index);

    // Reviews of those products
    let mut reviews = txn.open_table(tables::REVIEWS)?;
    let mut review_ids = Vec::new();
    for entry in reviews.iter()? {
        let (key, value) = entry?;
        let review: ReviewRecord = decode(value.value())?;
        if product_ids.contains(&review.product_id) {
            review_ids.push(key.value());
        }
    }
    for review_id in &review_ids {
        reviews.remove(*review_id)?;
    }
    drop(reviews);

    // Ledgers
    let mut favorites = txn.open_table(tables::FAVORITES)?;
    let mut favorite_keys = Vec::new();
    for entry in favorites.iter()? {
        let (key, _) = entry?;
        if key.value().1 == organization_id {
            favorite_keys.push(key.value());
        }
    }
    for key in &favorite_keys {
        favorites.remove(*key)?;
    }
    drop(favorites);

    let mut ratings = txn.open_table(tables::RATINGS)?;
    let mut rating_keys = Vec::new();
    for entry in ratings.iter()? {
        let (key, _) = entry?;
        if key.value().1 == organization_id {
            rating_keys.push(key.value());
        }
    }
    for key in &rating_keys {
        ratings.remove(*key)?;
    }
    drop(ratings);

    let mut history = txn.open_table(tables::HISTORY)?;
    let mut history_keys = Vec::new();
    for entry in history.iter()? {
        let (key, value) = entry?;
        let row: HistoryRow = decode(value.value())?;
        if row.organization_id == organization_id {
            history_keys.push(key.value());
        }
    }
    for key in &history_keys {
        history.remove(*key)?;
    }

    tracing::info!(
        "Organization {} removed with {} products, {} reviews, {} favorites, {} ratings, {} history entries",
        organization_id,
        product_ids.len(),
        review_ids.len(),
        favorite_keys.len(),
        rating_keys.len(),
        history_keys.len()
    );

    Ok(())
}
