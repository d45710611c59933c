//! User queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;

use kiosky_core::{Email, Role, StoreId, UserId};

use super::{PgDatabase, map_delete_error, map_write_error};
use crate::db::{RepositoryError, UserRepository};
use crate::models::{NewUser, UserChanges, UserRecord};

/// Every user read joins the owned store so `owned_store_id` is never stale.
macro_rules! user_select {
    () => {
        r"
        SELECT u.id, u.email, u.full_name, u.password_hash, u.role,
               s.id AS owned_store_id, u.employed_at_store_id, u.created_at
        FROM kiosky.app_user u
        LEFT JOIN kiosky.store s ON s.owner_id = u.id
        "
    };
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    full_name: String,
    password_hash: String,
    role: Role,
    owned_store_id: Option<StoreId>,
    employed_at_store_id: Option<StoreId>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            email,
            full_name: row.full_name,
            password_hash: row.password_hash,
            role: row.role,
            owned_store_id: row.owned_store_id,
            employed_at_store_id: row.employed_at_store_id,
            created_at: row.created_at,
        })
    }
}

impl PgDatabase {
    async fn require_user(&self, id: UserId) -> Result<UserRecord, RepositoryError> {
        self.find_user(id).await?.ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl UserRepository for PgDatabase {
    #[instrument(skip(self), fields(user_id = %id))]
    async fn find_user(&self, id: UserId) -> Result<Option<UserRecord>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(concat!(user_select!(), "WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .map(UserRecord::try_from)
            .transpose()
    }

    #[instrument(skip(self, email))]
    async fn find_user_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(concat!(user_select!(), "WHERE u.email = $1"))
            .bind(email)
            .fetch_optional(self.pool())
            .await?
            .map(UserRecord::try_from)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<UserRecord>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(concat!(user_select!(), "ORDER BY u.id"))
            .fetch_all(self.pool())
            .await?
            .into_iter()
            .map(UserRecord::try_from)
            .collect()
    }

    #[instrument(skip(self, email))]
    async fn email_exists(&self, email: &Email) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM kiosky.app_user WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(self.pool())
        .await?;
        Ok(exists)
    }

    #[instrument(skip(self, user), fields(role = %user.role))]
    async fn insert_user(&self, user: &NewUser) -> Result<UserRecord, RepositoryError> {
        let id = sqlx::query_scalar::<_, UserId>(
            r"
            INSERT INTO kiosky.app_user (email, full_name, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(self.pool())
        .await
        .map_err(map_write_error)?;

        self.require_user(id).await
    }

    #[instrument(skip(self, changes), fields(user_id = %id))]
    async fn update_user(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<UserRecord, RepositoryError> {
        let updated = sqlx::query(
            r"
            UPDATE kiosky.app_user
            SET email = COALESCE($2, email),
                full_name = COALESCE($3, full_name),
                password_hash = COALESCE($4, password_hash),
                updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(changes.email.as_ref())
        .bind(changes.full_name.as_deref())
        .bind(changes.password_hash.as_deref())
        .execute(self.pool())
        .await
        .map_err(map_write_error)?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.require_user(id).await
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn set_user_role(
        &self,
        id: UserId,
        role: Role,
        employed_at: Option<StoreId>,
    ) -> Result<UserRecord, RepositoryError> {
        let updated = sqlx::query(
            r"
            UPDATE kiosky.app_user
            SET role = $2, employed_at_store_id = $3, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(role)
        .bind(employed_at)
        .execute(self.pool())
        .await
        .map_err(map_write_error)?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.require_user(id).await
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn delete_user(&self, id: UserId) -> Result<(), RepositoryError> {
        let deleted = sqlx::query("DELETE FROM kiosky.app_user WHERE id = $1")
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
