//! Product domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use kiosky_core::{CategoryId, Price, ProductId, Slug, StoreId};

/// A product listed in a category.
///
/// `store_id` is denormalized from the category and always equals
/// `category.store_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Unique within the store.
    pub slug: Slug,
    pub price: Price,
    pub description: Option<String>,
    /// Free-form attributes (size, color, ...).
    pub attributes: serde_json::Value,
    /// Image URLs or storage keys.
    pub images: Vec<String>,
    pub is_visible: bool,
    pub category_id: CategoryId,
    pub store_id: StoreId,
    pub created_at: DateTime<Utc>,
}

/// Writable product fields, used for both insert and update.
#[derive(Debug, Clone)]
pub struct ProductFields {
    pub name: String,
    pub slug: Slug,
    pub price: Price,
    pub description: Option<String>,
    pub attributes: serde_json::Value,
    pub images: Vec<String>,
    pub is_visible: bool,
    pub category_id: CategoryId,
    pub store_id: StoreId,
}

impl From<&Product> for ProductFields {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            slug: product.slug.clone(),
            price: product.price,
            description: product.description.clone(),
            attributes: product.attributes.clone(),
            images: product.images.clone(),
            is_visible: product.is_visible,
            category_id: product.category_id,
            store_id: product.store_id,
        }
    }
}
