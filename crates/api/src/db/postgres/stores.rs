//! Store queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;

use kiosky_core::{StoreDomain, StoreId, UserId};

use super::{PgDatabase, map_delete_error, map_write_error};
use crate::db::{RepositoryError, StoreRepository, UserRepository};
use crate::models::{NewUser, Store, StoreFields, UserRecord};

const STORE_COLUMNS: &str = "id, name, domain, theme_settings, owner_id, created_at";

#[derive(sqlx::FromRow)]
struct StoreRow {
    id: StoreId,
    name: String,
    domain: StoreDomain,
    theme_settings: serde_json::Value,
    owner_id: UserId,
    created_at: DateTime<Utc>,
}

impl From<StoreRow> for Store {
    fn from(row: StoreRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            domain: row.domain,
            theme_settings: row.theme_settings,
            owner_id: row.owner_id,
            created_at: row.created_at,
        }
    }
}

impl PgDatabase {
    async fn require_store(&self, id: StoreId) -> Result<Store, RepositoryError> {
        self.find_store(id).await?.ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl StoreRepository for PgDatabase {
    #[instrument(skip(self))]
    async fn list_stores(&self) -> Result<Vec<Store>, RepositoryError> {
        let sql = format!("SELECT {STORE_COLUMNS} FROM kiosky.store ORDER BY id");
        let rows = sqlx::query_as::<_, StoreRow>(&sql)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(Store::from).collect())
    }

    #[instrument(skip(self), fields(store_id = %id))]
    async fn find_store(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let sql = format!("SELECT {STORE_COLUMNS} FROM kiosky.store WHERE id = $1");
        let row = sqlx::query_as::<_, StoreRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(Store::from))
    }

    #[instrument(skip(self), fields(domain = %domain))]
    async fn domain_exists(&self, domain: &StoreDomain) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM kiosky.store WHERE domain = $1)",
        )
        .bind(domain)
        .fetch_one(self.pool())
        .await?;
        Ok(exists)
    }

    #[instrument(skip(self, owner, store), fields(domain = %store.domain))]
    async fn insert_owner_with_store(
        &self,
        owner: &NewUser,
        store: &StoreFields,
    ) -> Result<(UserRecord, Store), RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let owner_id = sqlx::query_scalar::<_, UserId>(
            r"
            INSERT INTO kiosky.app_user (email, full_name, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&owner.email)
        .bind(&owner.full_name)
        .bind(&owner.password_hash)
        .bind(owner.role)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        let store_id = sqlx::query_scalar::<_, StoreId>(
            r"
            INSERT INTO kiosky.store (name, domain, theme_settings, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&store.name)
        .bind(&store.domain)
        .bind(&store.theme_settings)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        tx.commit().await?;

        let user = self
            .find_user(owner_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let store = self.require_store(store_id).await?;
        Ok((user, store))
    }

    #[instrument(skip(self, store), fields(owner_id = %owner_id, domain = %store.domain))]
    async fn insert_store(
        &self,
        owner_id: UserId,
        store: &StoreFields,
        promote_to_owner: bool,
    ) -> Result<Store, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let store_id = sqlx::query_scalar::<_, StoreId>(
            r"
            INSERT INTO kiosky.store (name, domain, theme_settings, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&store.name)
        .bind(&store.domain)
        .bind(&store.theme_settings)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        if promote_to_owner {
            sqlx::query(
                r"
                UPDATE kiosky.app_user
                SET role = 'OWNER', employed_at_store_id = NULL, updated_at = now()
                WHERE id = $1
                ",
            )
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        self.require_store(store_id).await
    }

    #[instrument(skip(self, store), fields(store_id = %id))]
    async fn update_store(
        &self,
        id: StoreId,
        store: &StoreFields,
    ) -> Result<Store, RepositoryError> {
        let sql = format!(
            r"
            UPDATE kiosky.store
            SET name = $2, domain = $3, theme_settings = $4
            WHERE id = $1
            RETURNING {STORE_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, StoreRow>(&sql)
            .bind(id)
            .bind(&store.name)
            .bind(&store.domain)
            .bind(&store.theme_settings)
            .fetch_optional(self.pool())
            .await
            .map_err(map_write_error)?;

        row.map(Store::from).ok_or(RepositoryError::NotFound)
    }

    #[instrument(skip(self), fields(store_id = %id))]
    async fn delete_store(&self, id: StoreId) -> Result<(), RepositoryError> {
        let deleted = sqlx::query("DELETE FROM kiosky.store WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_delete_error)?;

        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
