use redb::{Database, ReadableTable};

use crate::constants::{ERR_ACCOUNT_NOT_FOUND, SEQ_ACCOUNTS};
use crate::db::{decode, encode, next_id, now, tables};
use crate::error::{AppError, Result};
use crate::models::account::normalize_email;
use crate::models::validation::{validate_email, validate_username};
use crate::models::{Account, AccountCategory, AccountRecord};

/// Register a new account
///
/// Returns 409 Conflict if the email is already taken.
pub fn register(
    db: &Database,
    email: &str,
    username: &str,
    category: AccountCategory,
) -> Result<Account> {
    let email = normalize_email(email);
    let username = username.trim().to_string();

    validate_email(&email).map_err(AppError::InvalidInput)?;
    validate_username(&username).map_err(AppError::InvalidInput)?;
    if category == AccountCategory::Unassigned {
        return Err(AppError::InvalidInput(
            "Category must be 0 (general user) or 1 (business owner)".to_string(),
        ));
    }

    let write_txn = db.begin_write()?;
    let account = {
        let mut emails = write_txn.open_table(tables::ACCOUNT_EMAILS)?;
        if emails.get(email.as_str())?.is_some() {
            tracing::info!("Registration rejected: email already taken");
            return Err(AppError::Conflict("The email is already taken"));
        }

        let id = next_id(&write_txn, SEQ_ACCOUNTS)?;
        let created_at = now();
        let account = Account {
            id,
            email,
            username,
            category,
            created_at,
            updated_at: created_at,
        };

        let mut accounts = write_txn.open_table(tables::ACCOUNTS)?;
        accounts.insert(id, encode(&account.to_record())?.as_slice())?;
        emails.insert(account.email.as_str(), id)?;
        account
    };
    write_txn.commit()?;

    tracing::info!(
        "New account {} registered as {:?}",
        account.id,
        account.category
    );

    Ok(account)
}

/// Load an account by id
pub fn get(db: &Database, id: u64) -> Result<Account> {
    let read_txn = db.begin_read()?;
    let accounts = read_txn.open_table(tables::ACCOUNTS)?;

    let record: AccountRecord = accounts
        .get(id)?
        .map(|bytes| decode(bytes.value()))
        .transpose()?
        .ok_or(AppError::NotFound(ERR_ACCOUNT_NOT_FOUND))?;

    Ok(Account::from_record(id, record))
}

/// Change the account's username
pub fn update_username(db: &Database, account: &Account, username: &str) -> Result<Account> {
    let username = username.trim().to_string();
    validate_username(&username).map_err(AppError::InvalidInput)?;

    let write_txn = db.begin_write()?;
    let updated = {
        let mut accounts = write_txn.open_table(tables::ACCOUNTS)?;
        let record: AccountRecord = accounts
            .get(account.id)?
            .map(|bytes| decode(bytes.value()))
            .transpose()?
            .ok_or(AppError::NotFound(ERR_ACCOUNT_NOT_FOUND))?;

        let mut updated = Account::from_record(account.id, record);
        updated.username = username;
        updated.updated_at = now();
        accounts.insert(updated.id, encode(&updated.to_record())?.as_slice())?;
        updated
    };
    write_txn.commit()?;

    Ok(updated)
}

/// Accounts whose username contains `fragment` (case-insensitive), id order
pub fn search(db: &Database, fragment: &str) -> Result<Vec<Account>> {
    let fragment = fragment.trim().to_lowercase();

    let read_txn = db.begin_read()?;
    let accounts = read_txn.open_table(tables::ACCOUNTS)?;

    let mut found = Vec::new();
    for entry in accounts.iter()? {
        let (key, value) = entry?;
        let record: AccountRecord = decode(value.value())?;
        if record.username.to_lowercase().contains(&fragment) {
            found.push(Account::from_record(key.value(), record));
        }
    }

    Ok(found)
}
