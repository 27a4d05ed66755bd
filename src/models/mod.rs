pub mod account;
pub mod ledger;
pub mod organization;
pub mod product;
pub mod review;
pub mod validation;

pub use account::{Account, AccountCategory, AccountRecord, AccountView};
pub use ledger::{
    FavoriteRecord, FavoriteRow, HistoryRecord, HistoryRow, RatingRecord, RatingRow,
};
pub use organization::{
    Organization, OrganizationDetail, OrganizationPage, OrganizationPatch, OrganizationProfile,
    OrganizationRecord,
};
pub use product::{Product, ProductDraft, ProductRecord};
pub use review::{Review, ReviewDraft, ReviewPatch, ReviewRecord};
