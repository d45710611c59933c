//! Category domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use kiosky_core::{CategoryId, Slug, StoreId};

/// A product category, scoped to one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// Unique within the store.
    pub slug: Slug,
    pub store_id: StoreId,
    pub created_at: DateTime<Utc>,
}

/// Writable category fields, used for both insert and update.
#[derive(Debug, Clone)]
pub struct CategoryFields {
    pub name: String,
    pub slug: Slug,
    pub store_id: StoreId,
}
