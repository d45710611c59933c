//! `PostgreSQL` repositories.
//!
//! Queries are checked at runtime (`sqlx::query_as` with `FromRow` row types),
//! so the crate builds without a live database or an offline query cache.

mod categories;
mod products;
mod stores;
mod users;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use super::{Database, RepositoryError};

/// `PostgreSQL`-backed [`Database`].
#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Database for PgDatabase {
    #[instrument(skip(self))]
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// What a unique constraint protects, as shown to clients.
fn conflict_subject(constraint: &str) -> &'static str {
    match constraint {
        "app_user_email_key" => "email",
        "store_domain_key" => "domain",
        "store_owner_key" => "store for this user",
        "category_store_slug_key" => "category slug",
        "product_store_slug_key" => "product slug",
        _ => "record",
    }
}

/// Why a delete was blocked by a foreign key.
fn in_use_subject(constraint: &str) -> &'static str {
    match constraint {
        "store_owner_fkey" => "user still owns a store",
        "category_store_fkey" => "store still has categories",
        "product_store_fkey" => "store still has products",
        "product_category_store_fkey" => "category still has products",
        _ => "record is still referenced",
    }
}

/// Map an insert/update failure. A foreign key violation here means a
/// referenced row is gone.
fn map_write_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            let subject = conflict_subject(db_err.constraint().unwrap_or_default());
            return RepositoryError::Conflict(subject.to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
    }
    RepositoryError::Database(err)
}

/// Map a delete failure. A foreign key violation here means dependents exist.
fn map_delete_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_foreign_key_violation()
    {
        let subject = in_use_subject(db_err.constraint().unwrap_or_default());
        return RepositoryError::InUse(subject.to_owned());
    }
    RepositoryError::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_subjects_cover_unique_constraints() {
        assert_eq!(conflict_subject("app_user_email_key"), "email");
        assert_eq!(conflict_subject("store_domain_key"), "domain");
        assert_eq!(conflict_subject("product_store_slug_key"), "product slug");
        assert_eq!(conflict_subject("something_else"), "record");
    }

    #[test]
    fn test_in_use_subjects() {
        assert_eq!(
            in_use_subject("product_category_store_fkey"),
            "category still has products"
        );
        assert_eq!(in_use_subject("store_owner_fkey"), "user still owns a store");
    }
}
