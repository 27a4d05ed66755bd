use redb::{Database, ReadTransaction, ReadableTable};

use crate::constants::{
    ERR_NO_OWN_ORGANIZATION, ERR_ORGANIZATION_NOT_FOUND, ERR_PRODUCT_NOT_FOUND, SEQ_PRODUCTS,
};
use crate::db::{decode, encode, keys_for, next_id, now, tables};
use crate::error::{AppError, Result};
use crate::models::{Account, Product, ProductDraft, ProductRecord};

/// Add a product to the business owner's organization
pub fn create(db: &Database, owner: &Account, draft: ProductDraft) -> Result<Product> {
    owner.require_business_owner()?;
    draft.validate().map_err(AppError::InvalidInput)?;

    let write_txn = db.begin_write()?;
    let (id, record) = {
        let owners = write_txn.open_table(tables::OWNER_ORGANIZATIONS)?;
        let organization_id = owners
            .get(owner.id)?
            .map(|v| v.value())
            .ok_or(AppError::NotFound(ERR_NO_OWN_ORGANIZATION))?;

        let id = next_id(&write_txn, SEQ_PRODUCTS)?;
        let created_at = now();
        let record = ProductRecord {
            organization_id,
            name: draft.name.trim().to_string(),
            description: draft.description.trim().to_string(),
            url: draft.url.trim().to_string(),
            created_at,
            updated_at: created_at,
        };

        let mut products = write_txn.open_table(tables::PRODUCTS)?;
        products.insert(id, encode(&record)?.as_slice())?;
        let mut index = write_txn.open_table(tables::ORGANIZATION_PRODUCTS)?;
        index.insert((organization_id, id), ())?;
        (id, record)
    };
    write_txn.commit()?;

    tracing::info!(
        "Product {} added to organization {}",
        id,
        record.organization_id
    );

    Ok(Product::from_record(id, record))
}

/// Products of the business owner's organization
pub fn list_own(db: &Database, owner: &Account) -> Result<Vec<Product>> {
    owner.require_business_owner()?;

    let read_txn = db.begin_read()?;
    let organization_id = {
        let owners = read_txn.open_table(tables::OWNER_ORGANIZATIONS)?;
        let id = owners.get(owner.id)?.map(|v| v.value());
        id.ok_or(AppError::NotFound(ERR_NO_OWN_ORGANIZATION))?
    };

    products_of(&read_txn, organization_id)
}

/// Public listing of an organization's products
pub fn list_for_organization(db: &Database, organization_id: u64) -> Result<Vec<Product>> {
    let read_txn = db.begin_read()?;
    {
        let organizations = read_txn.open_table(tables::ORGANIZATIONS)?;
        if organizations.get(organization_id)?.is_none() {
            return Err(AppError::NotFound(ERR_ORGANIZATION_NOT_FOUND));
        }
    }

    products_of(&read_txn, organization_id)
}

/// Load a single product
pub fn get(db: &Database, id: u64) -> Result<Product> {
    let read_txn = db.begin_read()?;
    let products = read_txn.open_table(tables::PRODUCTS)?;

    let record: ProductRecord = products
        .get(id)?
        .map(|bytes| decode(bytes.value()))
        .transpose()?
        .ok_or(AppError::NotFound(ERR_PRODUCT_NOT_FOUND))?;

    Ok(Product::from_record(id, record))
}

fn products_of(txn: &ReadTransaction, organization_id: u64) -> Result<Vec<Product>> {
    let index = txn.open_table(tables::ORGANIZATION_PRODUCTS)?;
    let products = txn.open_table(tables::PRODUCTS)?;

    let mut found = Vec::new();
    for entry in index.range(keys_for(organization_id))? {
        let (key, _) = entry?;
        let id = key.value().1;
        if let Some(bytes) = products.get(id)? {
            found.push(Product::from_record(id, decode(bytes.value())?));
        }
    }

    Ok(found)
}
