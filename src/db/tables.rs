use redb::TableDefinition;

/// Accounts table: account_id -> AccountRecord (serialized)
pub const ACCOUNTS: TableDefinition<u64, &[u8]> = TableDefinition::new("accounts");

/// Email index: normalised email -> account_id (enforces unique emails)
pub const ACCOUNT_EMAILS: TableDefinition<&str, u64> = TableDefinition::new("account_emails");

/// Organizations table: organization_id -> OrganizationRecord (serialized)
pub const ORGANIZATIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("organizations");

/// Owner index: business owner account_id -> organization_id (one per owner)
pub const OWNER_ORGANIZATIONS: TableDefinition<u64, u64> =
    TableDefinition::new("owner_organizations");

/// Products table: product_id -> ProductRecord (serialized)
pub const PRODUCTS: TableDefinition<u64, &[u8]> = TableDefinition::new("products");

/// Product index: (organization_id, product_id) -> ()
/// Used for organization detail views and cascade delete
pub const ORGANIZATION_PRODUCTS: TableDefinition<(u64, u64), ()> =
    TableDefinition::new("organization_products");

/// Reviews table: review_id -> ReviewRecord (serialized)
pub const REVIEWS: TableDefinition<u64, &[u8]> = TableDefinition::new("reviews");

/// Favorite ledger: (account_id, organization_id) -> FavoriteRow (serialized)
pub const FAVORITES: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("favorites");

/// Rating ledger: (account_id, organization_id) -> RatingRow (serialized)
pub const RATINGS: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("ratings");

/// Browsing history ledger: (account_id, seq) -> HistoryRow (serialized)
pub const HISTORY: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("history");

/// Id sequences: sequence name -> last issued value
pub const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");
