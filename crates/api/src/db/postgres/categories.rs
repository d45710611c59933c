//! Category queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;

use kiosky_core::{CategoryId, Slug, StoreId};

use super::{PgDatabase, map_delete_error, map_write_error};
use crate::db::{CategoryRepository, RepositoryError};
use crate::models::{Category, CategoryFields};

const CATEGORY_COLUMNS: &str = "id, name, slug, store_id, created_at";

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    slug: Slug,
    store_id: StoreId,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            store_id: row.store_id,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CategoryRepository for PgDatabase {
    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM kiosky.category ORDER BY id");
        let rows = sqlx::query_as::<_, CategoryRow>(&sql)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    #[instrument(skip(self), fields(category_id = %id))]
    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM kiosky.category WHERE id = $1");
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(Category::from))
    }

    #[instrument(skip(self), fields(store_id = %store_id))]
    async fn list_categories_by_store(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<Category>, RepositoryError> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM kiosky.category WHERE store_id = $1 ORDER BY id"
        );
        let rows = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(store_id)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    #[instrument(skip(self), fields(store_id = %store_id, slug = %slug))]
    async fn find_category_by_slug(
        &self,
        store_id: StoreId,
        slug: &Slug,
    ) -> Result<Option<Category>, RepositoryError> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM kiosky.category WHERE store_id = $1 AND slug = $2"
        );
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(store_id)
            .bind(slug)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(Category::from))
    }

    #[instrument(skip(self, category), fields(store_id = %category.store_id))]
    async fn insert_category(
        &self,
        category: &CategoryFields,
    ) -> Result<Category, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO kiosky.category (name, slug, store_id)
            VALUES ($1, $2, $3)
            RETURNING {CATEGORY_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(&category.name)
            .bind(&category.slug)
            .bind(category.store_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_write_error)?;
        Ok(row.into())
    }

    /// The owning store is fixed at creation; only name and slug change.
    #[instrument(skip(self, category), fields(category_id = %id))]
    async fn update_category(
        &self,
        id: CategoryId,
        category: &CategoryFields,
    ) -> Result<Category, RepositoryError> {
        let sql = format!(
            r"
            UPDATE kiosky.category
            SET name = $2, slug = $3
            WHERE id = $1
            RETURNING {CATEGORY_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(id)
            .bind(&category.name)
            .bind(&category.slug)
            .fetch_optional(self.pool())
            .await
            .map_err(map_write_error)?;
        row.map(Category::from).ok_or(RepositoryError::NotFound)
    }

    #[instrument(skip(self), fields(category_id = %id))]
    async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let deleted = sqlx::query("DELETE FROM kiosky.category WHERE id = $1")
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
