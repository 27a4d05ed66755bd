use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::validation::timestamp_to_rfc3339;

/// Account category
///
/// Stored as a small integer code. Codes this build does not know decode to
/// `Unassigned`, which holds no capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountCategory {
    GeneralUser,
    BusinessOwner,
    Unassigned,
}

impl AccountCategory {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => AccountCategory::GeneralUser,
            1 => AccountCategory::BusinessOwner,
            _ => AccountCategory::Unassigned,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            AccountCategory::GeneralUser => 0,
            AccountCategory::BusinessOwner => 1,
            AccountCategory::Unassigned => u8::MAX,
        }
    }
}

/// Account record stored in redb, keyed by account id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    pub email: String,
    pub username: String,
    pub category: u8,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Account resolved from storage; passed explicitly to every ledger operation
#[derive(Debug, Clone)]
pub struct Account {
    pub id: u64,
    pub email: String,
    pub username: String,
    pub category: AccountCategory,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Account {
    pub fn from_record(id: u64, record: AccountRecord) -> Self {
        Self {
            id,
            email: record.email,
            username: record.username,
            category: AccountCategory::from_code(record.category),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    pub fn to_record(&self) -> AccountRecord {
        AccountRecord {
            email: self.email.clone(),
            username: self.username.clone(),
            category: self.category.code(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Favorites, ratings, history and reviews belong to general users only
    pub fn require_general_user(&self) -> Result<()> {
        match self.category {
            AccountCategory::GeneralUser => Ok(()),
            AccountCategory::BusinessOwner | AccountCategory::Unassigned => {
                tracing::warn!(
                    "Account {} ({:?}) denied general-user action",
                    self.id,
                    self.category
                );
                Err(AppError::Forbidden)
            }
        }
    }

    /// Organization and product management belong to business owners only
    pub fn require_business_owner(&self) -> Result<()> {
        match self.category {
            AccountCategory::BusinessOwner => Ok(()),
            AccountCategory::GeneralUser | AccountCategory::Unassigned => {
                tracing::warn!(
                    "Account {} ({:?}) denied business-owner action",
                    self.id,
                    self.category
                );
                Err(AppError::Forbidden)
            }
        }
    }

    pub fn view(&self) -> AccountView {
        AccountView {
            id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
            category: self.category,
            created_at: timestamp_to_rfc3339(self.created_at),
            updated_at: timestamp_to_rfc3339(self.updated_at),
        }
    }
}

/// Account model for API responses
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: u64,
    pub email: String,
    pub username: String,
    pub category: AccountCategory,
    pub created_at: String,
    pub updated_at: String,
}

/// Normalise an email for uniqueness checks
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(category: AccountCategory) -> Account {
        Account {
            id: 1,
            email: "a@b.io".to_string(),
            username: "a".to_string(),
            category,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_category_codes() {
        assert_eq!(AccountCategory::from_code(0), AccountCategory::GeneralUser);
        assert_eq!(AccountCategory::from_code(1), AccountCategory::BusinessOwner);
        assert_eq!(AccountCategory::from_code(2), AccountCategory::Unassigned);
        assert_eq!(AccountCategory::from_code(200), AccountCategory::Unassigned);

        for category in [AccountCategory::GeneralUser, AccountCategory::BusinessOwner] {
            assert_eq!(AccountCategory::from_code(category.code()), category);
        }
    }

    #[test]
    fn test_general_user_capabilities() {
        let user = account(AccountCategory::GeneralUser);
        assert!(user.require_general_user().is_ok());
        assert!(matches!(
            user.require_business_owner(),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn test_business_owner_capabilities() {
        let owner = account(AccountCategory::BusinessOwner);
        assert!(owner.require_business_owner().is_ok());
        assert!(matches!(
            owner.require_general_user(),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn test_unassigned_has_no_capabilities() {
        let nobody = account(AccountCategory::Unassigned);
        assert!(nobody.require_general_user().is_err());
        assert!(nobody.require_business_owner().is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Luke@Rebels.ORG "), "luke@rebels.org");
    }

    #[test]
    fn test_category_serializes_snake_case() {
        let json = serde_json::to_value(AccountCategory::BusinessOwner).unwrap();
        assert_eq!(json, "business_owner");
    }
}
