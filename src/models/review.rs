use serde::{Deserialize, Serialize};

use crate::models::validation::{timestamp_to_rfc3339, validate_length};

/// Request body for posting a review
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDraft {
    pub product_id: u64,
    pub title: String,
    pub comment: String,
}

/// Partial update of a review
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPatch {
    pub title: Option<String>,
    pub comment: Option<String>,
}

/// Review record stored in redb, keyed by review id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub author_id: u64,
    pub product_id: u64,
    pub title: String,
    pub comment: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ReviewRecord {
    pub fn validate(&self) -> Result<(), String> {
        validate_length("Title", &self.title, 1, 30)?;
        validate_length("Comment", &self.comment, 1, 500)
    }

    pub fn apply(&mut self, patch: ReviewPatch) {
        if let Some(title) = patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(comment) = patch.comment {
            self.comment = comment.trim().to_string();
        }
    }
}

/// Review model for API responses
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: u64,
    pub title: String,
    pub comment: String,
    pub product: u64,
    pub author: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl Review {
    pub fn from_record(id: u64, record: ReviewRecord) -> Self {
        Self {
            id,
            title: record.title,
            comment: record.comment,
            product: record.product_id,
            author: record.author_id,
            created_at: timestamp_to_rfc3339(record.created_at),
            updated_at: timestamp_to_rfc3339(record.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ReviewRecord {
        ReviewRecord {
            author_id: 1,
            product_id: 2,
            title: "Great".to_string(),
            comment: "Works as advertised".to_string(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_validate_review() {
        assert!(record().validate().is_ok());

        let mut long_title = record();
        long_title.title = "t".repeat(31);
        assert!(long_title.validate().is_err());
    }

    #[test]
    fn test_apply_patch() {
        let mut r = record();
        r.apply(ReviewPatch {
            title: None,
            comment: Some("  Changed my mind ".to_string()),
        });

        assert_eq!(r.title, "Great");
        assert_eq!(r.comment, "Changed my mind");

        r.apply(ReviewPatch {
            title: Some(String::new()),
            comment: None,
        });
        assert!(r.validate().is_err());
    }
}
