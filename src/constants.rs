/// Maximum number of browsing history entries retained per account.
/// Older entries are evicted on insert once this is exceeded.
pub const MAX_HISTORY_CAPACITY: usize = 20;

/// Lowest accepted star rating (inclusive)
pub const MIN_STARS: u8 = 1;

/// Highest accepted star rating (inclusive)
pub const MAX_STARS: u8 = 5;

/// Organizations returned per page by the public listing
pub const PAGE_SIZE: usize = 25;

/// Earliest accepted founding year for an organization
pub const MIN_FOUNDED_YEAR: i32 = 1400;

/// Prefix of the string signed into every bearer token
pub const TOKEN_SUBJECT_PREFIX: &str = "account:";

// =============================================================================
// Sequence Names
// =============================================================================

pub const SEQ_ACCOUNTS: &str = "accounts";
pub const SEQ_ORGANIZATIONS: &str = "organizations";
pub const SEQ_PRODUCTS: &str = "products";
pub const SEQ_REVIEWS: &str = "reviews";

/// Shared by favorites, ratings and history so rows order by creation
pub const SEQ_LEDGER: &str = "ledger";

// =============================================================================
// Error Messages
// =============================================================================

pub const ERR_ORGANIZATION_NOT_FOUND: &str = "Organization not found";

pub const ERR_PRODUCT_NOT_FOUND: &str = "Product not found";

pub const ERR_REVIEW_NOT_FOUND: &str = "Review not found";

pub const ERR_ACCOUNT_NOT_FOUND: &str = "Account not found";

pub const ERR_NO_OWN_ORGANIZATION: &str = "No organization registered for this account";

pub const ERR_INVALID_STARS: &str = "Invalid rating: stars must be between 1 and 5";

pub const ERR_INVALID_PAGE: &str = "Invalid page";
