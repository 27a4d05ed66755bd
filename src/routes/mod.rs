pub mod accounts;
pub mod auth;
pub mod countries;
pub mod favorites;
pub mod health;
pub mod history;
pub mod organizations;
pub mod products;
pub mod ratings;
pub mod reviews;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub use health::health_check;

/// Build the application router with every endpoint attached
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Identity
        .route(
            "/api/accounts",
            post(accounts::register_account).get(accounts::search_accounts),
        )
        .route(
            "/api/accounts/me",
            get(accounts::get_me).patch(accounts::update_me),
        )
        .route("/api/accounts/:id", get(accounts::get_account))
        // Business owner
        .route(
            "/api/business/organization",
            post(organizations::create_organization)
                .get(organizations::get_own_organization)
                .patch(organizations::update_own_organization)
                .delete(organizations::delete_own_organization),
        )
        .route(
            "/api/business/products",
            post(products::create_product).get(products::list_own_products),
        )
        // Public directory
        .route("/api/countries", get(countries::list_countries))
        .route("/api/organizations", get(organizations::list_organizations))
        .route("/api/organizations/:id", get(organizations::get_organization))
        .route(
            "/api/organizations/:id/products",
            get(organizations::list_organization_products),
        )
        .route("/api/products/:id", get(products::get_product))
        // General user ledgers
        .route(
            "/api/favorites",
            post(favorites::add_favorite)
                .get(favorites::list_favorites)
                .delete(favorites::remove_favorite),
        )
        .route(
            "/api/ratings",
            post(ratings::rate_organization)
                .get(ratings::list_ratings)
                .delete(ratings::unrate_organization),
        )
        .route(
            "/api/history",
            post(history::record_view).get(history::list_history),
        )
        .route(
            "/api/reviews",
            post(reviews::create_review).get(reviews::list_reviews),
        )
        .route(
            "/api/reviews/:id",
            get(reviews::get_review)
                .patch(reviews::update_review)
                .delete(reviews::delete_review),
        )
        .with_state(state)
}
