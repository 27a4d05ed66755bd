use serde::{Deserialize, Serialize};

use crate::models::validation::{timestamp_to_rfc3339, validate_length, validate_url};

/// Request body for creating a product
#[derive(Debug, Clone, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub url: String,
}

impl ProductDraft {
    pub fn validate(&self) -> Result<(), String> {
        validate_length("Name", self.name.trim(), 1, 30)?;
        validate_length("Description", self.description.trim(), 1, 500)?;
        validate_url("Url", self.url.trim())
    }
}

/// Product record stored in redb, keyed by product id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub organization_id: u64,
    pub name: String,
    pub description: String,
    pub url: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Product model for API responses
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u64,
    pub organization: u64,
    pub name: String,
    pub description: String,
    pub url: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Product {
    pub fn from_record(id: u64, record: ProductRecord) -> Self {
        Self {
            id,
            organization: record.organization_id,
            name: record.name,
            description: record.description,
            url: record.url,
            created_at: timestamp_to_rfc3339(record.created_at),
            updated_at: timestamp_to_rfc3339(record.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_draft() {
        let draft = ProductDraft {
            name: "Lightsaber".to_string(),
            description: "Elegant weapon".to_string(),
            url: "https://example.com/saber".to_string(),
        };
        assert!(draft.validate().is_ok());

        let blank_name = ProductDraft {
            name: "   ".to_string(),
            ..draft.clone()
        };
        assert!(blank_name.validate().is_err());

        let bad_url = ProductDraft {
            url: "saber".to_string(),
            ..draft
        };
        assert!(bad_url.validate().is_err());
    }
}
