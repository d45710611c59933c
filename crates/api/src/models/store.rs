//! Store (tenant) domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use kiosky_core::{StoreDomain, StoreId, UserId};

/// A tenant store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    /// Unique, normalized domain slug.
    pub domain: StoreDomain,
    /// Opaque theme blob owned by the frontend.
    pub theme_settings: serde_json::Value,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Writable store fields, used for both insert and update.
#[derive(Debug, Clone)]
pub struct StoreFields {
    pub name: String,
    pub domain: StoreDomain,
    pub theme_settings: serde_json::Value,
}

impl From<&Store> for StoreFields {
    fn from(store: &Store) -> Self {
        Self {
            name: store.name.clone(),
            domain: store.domain.clone(),
            theme_settings: store.theme_settings.clone(),
        }
    }
}
