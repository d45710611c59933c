//! Product queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::instrument;

use kiosky_core::{CategoryId, Price, ProductId, Slug, StoreId};

use super::{PgDatabase, map_delete_error, map_write_error};
use crate::db::{ProductRepository, RepositoryError};
use crate::models::{Product, ProductFields};

const PRODUCT_COLUMNS: &str = "id, name, slug, price, description, attributes, images, \
                               is_visible, category_id, store_id, created_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    slug: Slug,
    price: Price,
    description: Option<String>,
    attributes: serde_json::Value,
    images: Vec<String>,
    is_visible: bool,
    category_id: CategoryId,
    store_id: StoreId,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            price: row.price,
            description: row.description,
            attributes: row.attributes,
            images: row.images,
            is_visible: row.is_visible,
            category_id: row.category_id,
            store_id: row.store_id,
            created_at: row.created_at,
        }
    }
}

/// Escape `LIKE` metacharacters so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl ProductRepository for PgDatabase {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM kiosky.product ORDER BY id");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM kiosky.product WHERE id = $1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(Product::from))
    }

    #[instrument(skip(self), fields(category_id = %category_id))]
    async fn list_products_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM kiosky.product WHERE category_id = $1 ORDER BY id"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(category_id)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self), fields(store_id = %store_id))]
    async fn list_products_by_store(
        &self,
        store_id: StoreId,
        visible_only: bool,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM kiosky.product
            WHERE store_id = $1 AND (is_visible OR NOT $2)
            ORDER BY id
            "
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(store_id)
            .bind(visible_only)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self), fields(store_id = %store_id))]
    async fn search_products(
        &self,
        store_id: StoreId,
        query: &str,
    ) -> Result<Vec<Product>, RepositoryError> {
        let pattern = format!("%{}%", escape_like(query));
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM kiosky.product
            WHERE store_id = $1 AND is_visible AND name ILIKE $2
            ORDER BY id
            "
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(store_id)
            .bind(pattern)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self), fields(store_id = %store_id, min = %min, max = %max))]
    async fn list_products_in_price_range(
        &self,
        store_id: StoreId,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM kiosky.product
            WHERE store_id = $1 AND is_visible AND price BETWEEN $2 AND $3
            ORDER BY price, id
            "
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(store_id)
            .bind(min)
            .bind(max)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self), fields(store_id = %store_id, slug = %slug))]
    async fn find_product_by_slug(
        &self,
        store_id: StoreId,
        slug: &Slug,
    ) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM kiosky.product WHERE store_id = $1 AND slug = $2"
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(store_id)
            .bind(slug)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(Product::from))
    }

    #[instrument(skip(self, product), fields(store_id = %product.store_id))]
    async fn insert_product(&self, product: &ProductFields) -> Result<Product, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO kiosky.product
                (name, slug, price, description, attributes, images, is_visible,
                 category_id, store_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PRODUCT_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(&product.name)
            .bind(&product.slug)
            .bind(product.price)
            .bind(product.description.as_deref())
            .bind(&product.attributes)
            .bind(&product.images)
            .bind(product.is_visible)
            .bind(product.category_id)
            .bind(product.store_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_write_error)?;
        Ok(row.into())
    }

    #[instrument(skip(self, product), fields(product_id = %id))]
    async fn update_product(
        &self,
        id: ProductId,
        product: &ProductFields,
    ) -> Result<Product, RepositoryError> {
        let sql = format!(
            r"
            UPDATE kiosky.product
            SET name = $2, slug = $3, price = $4, description = $5, attributes = $6,
                images = $7, is_visible = $8, category_id = $9, store_id = $10
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .bind(&product.name)
            .bind(&product.slug)
            .bind(product.price)
            .bind(product.description.as_deref())
            .bind(&product.attributes)
            .bind(&product.images)
            .bind(product.is_visible)
            .bind(product.category_id)
            .bind(product.store_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_write_error)?;
        row.map(Product::from).ok_or(RepositoryError::NotFound)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn set_product_visibility(
        &self,
        id: ProductId,
        visible: bool,
    ) -> Result<Product, RepositoryError> {
        let sql = format!(
            "UPDATE kiosky.product SET is_visible = $2 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .bind(visible)
            .fetch_optional(self.pool())
            .await?;
        row.map(Product::from).ok_or(RepositoryError::NotFound)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let deleted = sqlx::query("DELETE FROM kiosky.product WHERE id = $1")
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
