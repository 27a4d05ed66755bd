use redb::{Database, ReadableTable};

use crate::constants::{ERR_PRODUCT_NOT_FOUND, ERR_REVIEW_NOT_FOUND, SEQ_REVIEWS};
use crate::db::{decode, encode, next_id, now, tables};
use crate::error::{AppError, Result};
use crate::models::{Account, Review, ReviewDraft, ReviewPatch, ReviewRecord};

/// Post a review of a product
pub fn create(db: &Database, author: &Account, draft: ReviewDraft) -> Result<Review> {
    author.require_general_user()?;

    let created_at = now();
    let record = ReviewRecord {
        author_id: author.id,
        product_id: draft.product_id,
        title: draft.title.trim().to_string(),
        comment: draft.comment.trim().to_string(),
        created_at,
        updated_at: created_at,
    };
    record.validate().map_err(AppError::InvalidInput)?;

    let write_txn = db.begin_write()?;
    let id = {
        let products = write_txn.open_table(tables::PRODUCTS)?;
        if products.get(record.product_id)?.is_none() {
            return Err(AppError::NotFound(ERR_PRODUCT_NOT_FOUND));
        }

        let id = next_id(&write_txn, SEQ_REVIEWS)?;
        let mut reviews = write_txn.open_table(tables::REVIEWS)?;
        reviews.insert(id, encode(&record)?.as_slice())?;
        id
    };
    write_txn.commit()?;

    tracing::info!(
        "Review {} of product {} posted by account {}",
        id,
        record.product_id,
        author.id
    );

    Ok(Review::from_record(id, record))
}

/// The author's reviews in id order
pub fn list(db: &Database, author: &Account) -> Result<Vec<Review>> {
    author.require_general_user()?;

    let read_txn = db.begin_read()?;
    let reviews = read_txn.open_table(tables::REVIEWS)?;

    let mut found = Vec::new();
    for entry in reviews.iter()? {
        let (key, value) = entry?;
        let record: ReviewRecord = decode(value.value())?;
        if record.author_id == author.id {
            found.push(Review::from_record(key.value(), record));
        }
    }

    Ok(found)
}

/// One of the author's own reviews; other authors' reviews are reported missing
pub fn get(db: &Database, author: &Account, id: u64) -> Result<Review> {
    author.require_general_user()?;

    let read_txn = db.begin_read()?;
    let reviews = read_txn.open_table(tables::REVIEWS)?;
    let record: ReviewRecord = reviews
        .get(id)?
        .map(|bytes| decode(bytes.value()))
        .transpose()?
        .filter(|r: &ReviewRecord| r.author_id == author.id)
        .ok_or(AppError::NotFound(ERR_REVIEW_NOT_FOUND))?;

    Ok(Review::from_record(id, record))
}

pub fn update(db: &Database, author: &Account, id: u64, patch: ReviewPatch) -> Result<Review> {
    author.require_general_user()?;

    let write_txn = db.begin_write()?;
    let record = {
        let mut reviews = write_txn.open_table(tables::REVIEWS)?;
        let mut record: ReviewRecord = reviews
            .get(id)?
            .map(|bytes| decode(bytes.value()))
            .transpose()?
            .filter(|r: &ReviewRecord| r.author_id == author.id)
            .ok_or(AppError::NotFound(ERR_REVIEW_NOT_FOUND))?;

        record.apply(patch);
        record.validate().map_err(AppError::InvalidInput)?;
        record.updated_at = now();
        reviews.insert(id, encode(&record)?.as_slice())?;
        record
    };
    write_txn.commit()?;

    Ok(Review::from_record(id, record))
}

pub fn delete(db: &Database, author: &Account, id: u64) -> Result<()> {
    author.require_general_user()?;

    let write_txn = db.begin_write()?;
    {
        let mut reviews = write_txn.open_table(tables::REVIEWS)?;
        let owned = reviews
            .get(id)?
            .map(|bytes| decode::<ReviewRecord>(bytes.value()))
            .transpose()?
            .is_some_and(|r| r.author_id == author.id);
        if !owned {
            return Err(AppError::NotFound(ERR_REVIEW_NOT_FOUND));
        }
        reviews.remove(id)?;
    }
    write_txn.commit()?;

    tracing::info!("Review {} deleted by account {}", id, author.id);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{business_owner, general_user, test_db};
    use crate::db::{organizations, products};
    use crate::models::organization::fixtures::profile;
    use crate::models::ProductDraft;

    fn product(db: &Database) -> u64 {
        let owner = business_owner(db, "obiwan@jedi.org");
        organizations::create(db, &owner, profile("Jedi Supplies")).unwrap();
        products::create(
            db,
            &owner,
            ProductDraft {
                name: "Lightsaber".to_string(),
                description: "Elegant weapon".to_string(),
                url: "https://example.com/saber".to_string(),
            },
        )
        .unwrap()
        .id
    }

    fn draft(product_id: u64) -> ReviewDraft {
        ReviewDraft {
            product_id,
            title: "Great".to_string(),
            comment: "Cuts through anything".to_string(),
        }
    }

    #[test]
    fn test_review_lifecycle() {
        let (_dir, db) = test_db();
        let product_id = product(&db);
        let user = general_user(&db, "luke@rebels.org");

        let review = create(&db, &user, draft(product_id)).unwrap();
        assert_eq!(review.author, user.id);
        assert_eq!(review.product, product_id);

        assert_eq!(list(&db, &user).unwrap().len(), 1);

        let updated = update(
            &db,
            &user,
            review.id,
            ReviewPatch {
                title: Some("Even better".to_string()),
                comment: None,
            },
        )
        .unwrap();
        assert_eq!(updated.title, "Even better");
        assert_eq!(get(&db, &user, review.id).unwrap().title, "Even better");

        delete(&db, &user, review.id).unwrap();
        assert!(list(&db, &user).unwrap().is_empty());
    }

    #[test]
    fn test_review_of_missing_product() {
        let (_dir, db) = test_db();
        let user = general_user(&db, "luke@rebels.org");

        assert!(matches!(
            create(&db, &user, draft(77)),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_other_authors_reviews_are_hidden() {
        let (_dir, db) = test_db();
        let product_id = product(&db);
        let luke = general_user(&db, "luke@rebels.org");
        let leia = general_user(&db, "leia@rebels.org");

        let review = create(&db, &luke, draft(product_id)).unwrap();

        assert!(list(&db, &leia).unwrap().is_empty());
        assert!(matches!(get(&db, &leia, review.id), Err(AppError::NotFound(_))));
        assert!(matches!(
            delete(&db, &leia, review.id),
            Err(AppError::NotFound(_))
        ));
        assert!(get(&db, &luke, review.id).is_ok());
    }

    #[test]
    fn test_invalid_review_rejected() {
        let (_dir, db) = test_db();
        let product_id = product(&db);
        let user = general_user(&db, "luke@rebels.org");

        let mut bad = draft(product_id);
        bad.title = "   ".to_string();
        assert!(matches!(
            create(&db, &user, bad),
            Err(AppError::InvalidInput(_))
        ));
    }
}
