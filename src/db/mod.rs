pub mod accounts;
pub mod favorites;
pub mod history;
pub mod organizations;
pub mod products;
pub mod ratings;
pub mod reviews;
pub mod tables;

use redb::{Database, ReadableTable, WriteTransaction};
use serde::{de::DeserializeOwned, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

/// Database handle type (Arc-wrapped for sharing across handlers)
pub type Db = Arc<Database>;

const BINCODE_CONFIG: bincode::config::Configuration = bincode::config::standard();

/// Open or create the redb database at the given path
///
/// Creates all required tables on first run.
pub fn open_database(path: impl AsRef<Path>) -> Result<Db> {
    tracing::info!("Opening database at: {:?}", path.as_ref());

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                tracing::error!("Failed to create database directory: {}", e);
                redb::DatabaseError::Storage(redb::StorageError::Io(e))
            })?;
        }
    }

    let db = Database::create(path)?;

    // Initialize tables on first run
    let write_txn = db.begin_write()?;
    {
        let _ = write_txn.open_table(tables::ACCOUNTS)?;
        let _ = write_txn.open_table(tables::ACCOUNT_EMAILS)?;
        let _ = write_txn.open_table(tables::ORGANIZATIONS)?;
        let _ = write_txn.open_table(tables::OWNER_ORGANIZATIONS)?;
        let _ = write_txn.open_table(tables::PRODUCTS)?;
        let _ = write_txn.open_table(tables::ORGANIZATION_PRODUCTS)?;
        let _ = write_txn.open_table(tables::REVIEWS)?;
        let _ = write_txn.open_table(tables::FAVORITES)?;
        let _ = write_txn.open_table(tables::RATINGS)?;
        let _ = write_txn.open_table(tables::HISTORY)?;
        let _ = write_txn.open_table(tables::SEQUENCES)?;
    }
    write_txn.commit()?;

    tracing::info!("Database initialized successfully");

    Ok(Arc::new(db))
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serde::encode_to_vec(value, BINCODE_CONFIG)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (value, _) = bincode::serde::decode_from_slice(bytes, BINCODE_CONFIG)?;
    Ok(value)
}

/// Issue the next value of a named sequence (starts at 1)
///
/// Must not be called while the caller holds `SEQUENCES` open.
pub(crate) fn next_id(txn: &WriteTransaction, sequence: &str) -> Result<u64> {
    let mut sequences = txn.open_table(tables::SEQUENCES)?;
    let next = sequences.get(sequence)?.map(|v| v.value()).unwrap_or(0) + 1;
    sequences.insert(sequence, next)?;
    Ok(next)
}

/// All composite keys whose first component is `id`
pub(crate) fn keys_for(id: u64) -> RangeInclusive<(u64, u64)> {
    (id, 0)..=(id, u64::MAX)
}

pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
pub(crate) mod test_support {
    use tempfile::TempDir;

    use super::*;
    use crate::models::{Account, AccountCategory};

    /// Fresh database in a temporary directory; keep the `TempDir` alive
    pub fn test_db() -> (TempDir, Db) {
        let temp_dir = TempDir::new().unwrap();
        let db = open_database(temp_dir.path().join("test.db")).unwrap();
        (temp_dir, db)
    }

    pub fn general_user(db: &Database, email: &str) -> Account {
        accounts::register(db, email, "general", AccountCategory::GeneralUser).unwrap()
    }

    pub fn business_owner(db: &Database, email: &str) -> Account {
        accounts::register(db, email, "owner", AccountCategory::BusinessOwner).unwrap()
    }

    /// Register a fresh business owner and give them an organization
    pub fn organization(db: &Database, name: &str) -> u64 {
        let slug: String = name
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_lowercase();
        let owner = business_owner(db, &format!("{}@owners.test", slug));
        organizations::create(
            db,
            &owner,
            crate::models::organization::fixtures::profile(name),
        )
        .unwrap()
        .id
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::test_db;
    use super::*;

    #[test]
    fn test_next_id_is_monotonic_per_sequence() {
        let (_dir, db) = test_db();

        let write_txn = db.begin_write().unwrap();
        assert_eq!(next_id(&write_txn, "a").unwrap(), 1);
        assert_eq!(next_id(&write_txn, "a").unwrap(), 2);
        assert_eq!(next_id(&write_txn, "b").unwrap(), 1);
        write_txn.commit().unwrap();

        let write_txn = db.begin_write().unwrap();
        assert_eq!(next_id(&write_txn, "a").unwrap(), 3);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("test.db");

        {
            let db = open_database(&path).unwrap();
            let write_txn = db.begin_write().unwrap();
            next_id(&write_txn, "a").unwrap();
            write_txn.commit().unwrap();
        }

        let db = open_database(&path).unwrap();
        let write_txn = db.begin_write().unwrap();
        assert_eq!(next_id(&write_txn, "a").unwrap(), 2);
    }
}
