//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                   - Liveness
//! GET    /health/ready                             - Database ping
//!
//! # Auth (rate limited)
//! POST   /auth/register                            - Customer registration
//! POST   /auth/register-owner                      - Owner + store registration
//! POST   /auth/login                               - Password login
//! GET    /auth/me                                  - Current user (auth)
//! GET    /auth/email/exists?email=                 - Email availability
//!
//! # Stores
//! GET    /stores                                   - List
//! GET    /stores/{id}                              - Detail
//! GET    /stores/domain/exists?domain=             - Domain availability
//! POST   /stores/user/{user_id}                    - Create for a user (admin or self)
//! PUT    /stores/{id}                              - Update
//! PATCH  /stores/{id}/theme                        - Replace theme settings
//! DELETE /stores/{id}                              - Delete (empty stores only)
//!
//! # Categories
//! GET    /categories                               - List
//! GET    /categories/{id}                          - Detail
//! GET    /categories/store/{store_id}              - By store
//! GET    /categories/store/{store_id}/slug/{slug}  - By slug
//! GET    /categories/store/{store_id}/slug/{slug}/exists
//! POST   /categories                               - Create
//! PUT    /categories/{id}                          - Update
//! DELETE /categories/{id}                          - Delete (no products only)
//!
//! # Products
//! GET    /products                                 - List
//! GET    /products/{id}                            - Detail
//! GET    /products/category/{category_id}          - By category
//! GET    /products/store/{store_id}                - By store
//! GET    /products/store/{store_id}/visible        - Visible only
//! GET    /products/store/{store_id}/search?name=   - Name search (visible)
//! GET    /products/store/{store_id}/price-range?min=&max=
//! GET    /products/store/{store_id}/slug/{slug}    - By slug
//! GET    /products/store/{store_id}/slug/{slug}/exists
//! POST   /products                                 - Create
//! PUT    /products/{id}                            - Update / move
//! PATCH  /products/{id}/visibility                 - Show or hide
//! DELETE /products/{id}                            - Delete
//!
//! # Users
//! GET    /users                                    - List (admin)
//! GET    /users/{id}                               - Detail (admin or self)
//! PUT    /users/{id}                               - Update profile (admin or self)
//! PUT    /users/{id}/role                          - Change role (admin)
//! DELETE /users/{id}                               - Delete (admin or self)
//! ```

pub mod auth;
pub mod categories;
pub mod health;
pub mod products;
pub mod stores;
pub mod users;

use axum::Router;
use serde::Serialize;

use crate::config::ApiConfig;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Build the complete API router.
pub fn routes(config: &ApiConfig) -> Router<AppState> {
    let auth = if config.auth_rate_limit {
        auth::router().layer(auth_rate_limiter())
    } else {
        auth::router()
    };

    Router::new()
        .merge(health::router())
        .nest("/auth", auth)
        .nest("/stores", stores::router())
        .nest("/categories", categories::router())
        .nest("/products", products::router())
        .nest("/users", users::router())
}

/// Response for availability checks.
#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub exists: bool,
}
