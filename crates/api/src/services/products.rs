//! Product service.
//!
//! A product's store is always derived from its category. Mutations check the
//! actor against the product's current store and, when the product moves,
//! against the target category's store as well.

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::instrument;

use kiosky_core::{CategoryId, Price, Principal, ProductId, Slug, StoreId};

use super::{ensure_can_modify, missing_target, required_text};
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Category, Product, ProductFields};

const MAX_PRODUCT_NAME: usize = 200;
const MAX_DESCRIPTION: usize = 5000;

/// Input for a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub attributes: Option<Value>,
    pub images: Vec<String>,
    pub is_visible: Option<bool>,
    pub category_id: CategoryId,
}

/// Requested product changes. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub attributes: Option<Value>,
    pub images: Option<Vec<String>>,
    pub is_visible: Option<bool>,
    /// Move the product to another category, possibly in another store.
    pub category_id: Option<CategoryId>,
}

/// Product service.
pub struct ProductService<'a> {
    db: &'a dyn Database,
}

impl<'a> ProductService<'a> {
    #[must_use]
    pub const fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// List all products.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` on storage failure.
    pub async fn list(&self) -> Result<Vec<Product>> {
        Ok(self.db.list_products().await?)
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product does not exist.
    pub async fn get(&self, id: ProductId) -> Result<Product> {
        self.db
            .find_product(id)
            .await?
            .ok_or_else(|| AppError::not_found("Product"))
    }

    /// List the products of a category.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` on storage failure.
    pub async fn list_by_category(&self, category_id: CategoryId) -> Result<Vec<Product>> {
        Ok(self.db.list_products_by_category(category_id).await?)
    }

    /// List a store's products, optionally only the visible ones.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` on storage failure.
    pub async fn list_by_store(&self, store_id: StoreId, visible_only: bool) -> Result<Vec<Product>> {
        Ok(self.db.list_products_by_store(store_id, visible_only).await?)
    }

    /// Visible products of a store whose name contains `name`,
    /// case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for an empty search term.
    pub async fn search(&self, store_id: StoreId, name: &str) -> Result<Vec<Product>> {
        let name = required_text("search term", name, MAX_PRODUCT_NAME)?;
        Ok(self.db.search_products(store_id, &name).await?)
    }

    /// Visible products of a store priced within `[min, max]`, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if a bound is negative or `min > max`.
    pub async fn list_by_price_range(
        &self,
        store_id: StoreId,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<Product>> {
        let min = Price::new(min)?;
        let max = Price::new(max)?;
        if min > max {
            return Err(AppError::Validation(
                "min price must not exceed max price".to_string(),
            ));
        }
        Ok(self
            .db
            .list_products_in_price_range(store_id, min.amount(), max.amount())
            .await?)
    }

    /// Get a product by store and slug.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a malformed slug and
    /// `AppError::NotFound` if there is no such product.
    pub async fn get_by_slug(&self, store_id: StoreId, slug: &str) -> Result<Product> {
        let slug = Slug::parse(slug)?;
        self.db
            .find_product_by_slug(store_id, &slug)
            .await?
            .ok_or_else(|| AppError::not_found("Product"))
    }

    /// Whether `slug` is already used by a product of the store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a malformed slug.
    pub async fn slug_exists(&self, store_id: StoreId, slug: &str) -> Result<bool> {
        let slug = Slug::parse(slug)?;
        Ok(self.db.find_product_by_slug(store_id, &slug).await?.is_some())
    }

    /// Create a product in a category. Its store is the category's store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AccessDenied` unless the actor may modify the
    /// category's store (non-admins also get it for a missing category),
    /// `AppError::Validation` for bad input, and `AppError::AlreadyExists`
    /// if the slug is taken in that store.
    #[instrument(
        skip(self, actor, input),
        fields(actor_id = %actor.id, category_id = %input.category_id)
    )]
    pub async fn create(&self, actor: &Principal, input: NewProduct) -> Result<Product> {
        let category = self.load_category_for_mutation(actor, input.category_id).await?;

        let fields = ProductFields {
            name: required_text("product name", &input.name, MAX_PRODUCT_NAME)?,
            slug: Slug::parse(&input.slug)?,
            price: Price::new(input.price)?,
            description: optional_description(input.description)?,
            attributes: attributes(input.attributes)?,
            images: images(input.images)?,
            is_visible: input.is_visible.unwrap_or(true),
            category_id: category.id,
            store_id: category.store_id,
        };
        self.ensure_slug_free(fields.store_id, &fields.slug, None).await?;

        let product = self.db.insert_product(&fields).await?;
        tracing::info!(product_id = %product.id, store_id = %product.store_id, "Product created");
        Ok(product)
    }

    /// Update a product, optionally moving it to another category.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AccessDenied` unless the actor may modify both the
    /// current store and the target category's store.
    /// Returns `AppError::AlreadyExists` if the slug is taken in the target
    /// store.
    #[instrument(skip(self, actor, update), fields(actor_id = %actor.id, product_id = %id))]
    pub async fn update(
        &self,
        actor: &Principal,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product> {
        let current = self.load_for_mutation(actor, id).await?;
        let mut fields = ProductFields::from(&current);

        if let Some(category_id) = update.category_id.filter(|c| *c != current.category_id) {
            let target = self.load_category_for_mutation(actor, category_id).await?;
            fields.category_id = target.id;
            fields.store_id = target.store_id;
        }
        if let Some(name) = update.name {
            fields.name = required_text("product name", &name, MAX_PRODUCT_NAME)?;
        }
        if let Some(slug) = update.slug {
            fields.slug = Slug::parse(&slug)?;
        }
        if let Some(price) = update.price {
            fields.price = Price::new(price)?;
        }
        if update.description.is_some() {
            fields.description = optional_description(update.description)?;
        }
        if update.attributes.is_some() {
            fields.attributes = attributes(update.attributes)?;
        }
        if let Some(list) = update.images {
            fields.images = images(list)?;
        }
        if let Some(visible) = update.is_visible {
            fields.is_visible = visible;
        }

        if fields.slug != current.slug || fields.store_id != current.store_id {
            self.ensure_slug_free(fields.store_id, &fields.slug, Some(id))
                .await?;
        }

        let product = self.db.update_product(id, &fields).await?;
        tracing::info!(store_id = %product.store_id, "Product updated");
        Ok(product)
    }

    /// Show or hide a product.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AccessDenied` unless the actor may modify the
    /// product's store.
    #[instrument(skip(self, actor), fields(actor_id = %actor.id, product_id = %id))]
    pub async fn set_visibility(
        &self,
        actor: &Principal,
        id: ProductId,
        visible: bool,
    ) -> Result<Product> {
        self.load_for_mutation(actor, id).await?;
        Ok(self.db.set_product_visibility(id, visible).await?)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AccessDenied` unless the actor may modify the
    /// product's store.
    #[instrument(skip(self, actor), fields(actor_id = %actor.id, product_id = %id))]
    pub async fn delete(&self, actor: &Principal, id: ProductId) -> Result<()> {
        self.load_for_mutation(actor, id).await?;
        self.db.delete_product(id).await?;
        tracing::info!("Product deleted");
        Ok(())
    }

    async fn load_for_mutation(&self, actor: &Principal, id: ProductId) -> Result<Product> {
        let Some(product) = self.db.find_product(id).await? else {
            return Err(missing_target(actor, "Product"));
        };
        ensure_can_modify(actor, product.store_id)?;
        Ok(product)
    }

    async fn load_category_for_mutation(
        &self,
        actor: &Principal,
        id: CategoryId,
    ) -> Result<Category> {
        let Some(category) = self.db.find_category(id).await? else {
            return Err(missing_target(actor, "Category"));
        };
        ensure_can_modify(actor, category.store_id)?;
        Ok(category)
    }

    async fn ensure_slug_free(
        &self,
        store_id: StoreId,
        slug: &Slug,
        except: Option<ProductId>,
    ) -> Result<()> {
        match self.db.find_product_by_slug(store_id, slug).await? {
            Some(existing) if Some(existing.id) != except => {
                Err(AppError::AlreadyExists("product slug".to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// Trim a description; blank becomes `None`.
fn optional_description(description: Option<String>) -> Result<Option<String>> {
    let Some(text) = description.map(|d| d.trim().to_owned()) else {
        return Ok(None);
    };
    if text.is_empty() {
        return Ok(None);
    }
    if text.chars().count() > MAX_DESCRIPTION {
        return Err(AppError::Validation(format!(
            "description must be at most {MAX_DESCRIPTION} characters"
        )));
    }
    Ok(Some(text))
}

/// Attributes must be a JSON object. Missing means empty.
fn attributes(value: Option<Value>) -> Result<Value> {
    match value {
        None | Some(Value::Null) => Ok(Value::Object(serde_json::Map::new())),
        Some(obj @ Value::Object(_)) => Ok(obj),
        Some(_) => Err(AppError::Validation(
            "attributes must be a JSON object".to_string(),
        )),
    }
}

fn images(images: Vec<String>) -> Result<Vec<String>> {
    images
        .into_iter()
        .map(|image| {
            let image = image.trim().to_owned();
            if image.is_empty() {
                Err(AppError::Validation("image reference cannot be empty".to_string()))
            } else {
                Ok(image)
            }
        })
        .collect()
}
