//! Persistence for the Kiosky API.
//!
//! # Schema: `kiosky`
//!
//! - `app_user` - Accounts, roles, employee workplace
//! - `store` - Tenants, one per owner
//! - `category` - Per-store categories, `(store_id, slug)` unique
//! - `product` - Per-store products, `(category_id, store_id)` references
//!   `category(id, store_id)` so a product can never sit in another store's
//!   category
//!
//! Uniqueness is enforced by the storage layer. Services pre-check for
//! friendlier errors, but a lost race still surfaces as
//! [`RepositoryError::Conflict`].
//!
//! # Implementations
//!
//! - [`PgDatabase`] - `PostgreSQL` via sqlx
//! - [`MemoryDatabase`] - in-process tables behind one async mutex, used by
//!   tests and local demos
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p kiosky-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use kiosky_core::{CategoryId, Email, ProductId, Role, Slug, StoreDomain, StoreId, UserId};

use crate::models::{
    Category, CategoryFields, NewUser, Product, ProductFields, Store, StoreFields, UserChanges,
    UserRecord,
};

pub use memory::MemoryDatabase;
pub use postgres::PgDatabase;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation. Holds what collided (e.g. `"email"`).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Delete refused because other rows still reference the entity.
    #[error("in use: {0}")]
    InUse(String),
}

/// User account storage.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, id: UserId) -> Result<Option<UserRecord>, RepositoryError>;

    async fn find_user_by_email(&self, email: &Email)
    -> Result<Option<UserRecord>, RepositoryError>;

    async fn list_users(&self) -> Result<Vec<UserRecord>, RepositoryError>;

    async fn email_exists(&self, email: &Email) -> Result<bool, RepositoryError>;

    /// Insert a user. `Conflict("email")` if the email is taken.
    async fn insert_user(&self, user: &NewUser) -> Result<UserRecord, RepositoryError>;

    /// Apply profile changes. `NotFound` or `Conflict("email")`.
    async fn update_user(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<UserRecord, RepositoryError>;

    /// Replace role and workplace in one write.
    async fn set_user_role(
        &self,
        id: UserId,
        role: Role,
        employed_at: Option<StoreId>,
    ) -> Result<UserRecord, RepositoryError>;

    /// Delete a user. `InUse` while the user still owns a store.
    async fn delete_user(&self, id: UserId) -> Result<(), RepositoryError>;
}

/// Store storage.
#[async_trait]
pub trait StoreRepository: Send + Sync {
    async fn list_stores(&self) -> Result<Vec<Store>, RepositoryError>;

    async fn find_store(&self, id: StoreId) -> Result<Option<Store>, RepositoryError>;

    async fn domain_exists(&self, domain: &StoreDomain) -> Result<bool, RepositoryError>;

    /// Insert an `OWNER` and their store atomically. Neither row exists if
    /// either insert fails.
    async fn insert_owner_with_store(
        &self,
        owner: &NewUser,
        store: &StoreFields,
    ) -> Result<(UserRecord, Store), RepositoryError>;

    /// Insert a store for an existing user. With `promote_to_owner` the user
    /// becomes `OWNER` and loses any workplace in the same write.
    async fn insert_store(
        &self,
        owner_id: UserId,
        store: &StoreFields,
        promote_to_owner: bool,
    ) -> Result<Store, RepositoryError>;

    async fn update_store(&self, id: StoreId, store: &StoreFields)
    -> Result<Store, RepositoryError>;

    /// Delete a store. `InUse` while categories or products reference it.
    async fn delete_store(&self, id: StoreId) -> Result<(), RepositoryError>;
}

/// Category storage.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;

    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;

    async fn list_categories_by_store(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<Category>, RepositoryError>;

    async fn find_category_by_slug(
        &self,
        store_id: StoreId,
        slug: &Slug,
    ) -> Result<Option<Category>, RepositoryError>;

    async fn insert_category(&self, category: &CategoryFields)
    -> Result<Category, RepositoryError>;

    async fn update_category(
        &self,
        id: CategoryId,
        category: &CategoryFields,
    ) -> Result<Category, RepositoryError>;

    /// Delete a category. `InUse` while products reference it.
    async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError>;
}

/// Product storage.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn list_products_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError>;

    async fn list_products_by_store(
        &self,
        store_id: StoreId,
        visible_only: bool,
    ) -> Result<Vec<Product>, RepositoryError>;

    /// Visible products whose name contains `query`, case-insensitively.
    async fn search_products(
        &self,
        store_id: StoreId,
        query: &str,
    ) -> Result<Vec<Product>, RepositoryError>;

    /// Visible products priced within `[min, max]`.
    async fn list_products_in_price_range(
        &self,
        store_id: StoreId,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<Product>, RepositoryError>;

    async fn find_product_by_slug(
        &self,
        store_id: StoreId,
        slug: &Slug,
    ) -> Result<Option<Product>, RepositoryError>;

    async fn insert_product(&self, product: &ProductFields) -> Result<Product, RepositoryError>;

    async fn update_product(
        &self,
        id: ProductId,
        product: &ProductFields,
    ) -> Result<Product, RepositoryError>;

    async fn set_product_visibility(
        &self,
        id: ProductId,
        visible: bool,
    ) -> Result<Product, RepositoryError>;

    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError>;
}

/// Everything the API needs from storage.
#[async_trait]
pub trait Database:
    UserRepository + StoreRepository + CategoryRepository + ProductRepository
{
    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
