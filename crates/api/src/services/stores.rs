//! Store (tenant) service.

use tracing::instrument;

use kiosky_core::{Principal, Role, StoreDomain, StoreId, UserId};

use super::{ensure_can_modify, required_text};
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Store, StoreFields};

/// Store name length limit.
const MAX_STORE_NAME: usize = 100;

/// Requested store changes. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct StoreUpdate {
    pub name: Option<String>,
    pub domain: Option<String>,
    pub theme_settings: Option<serde_json::Value>,
}

/// Store service.
pub struct StoreService<'a> {
    db: &'a dyn Database,
}

impl<'a> StoreService<'a> {
    #[must_use]
    pub const fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// List all stores.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` on storage failure.
    pub async fn list(&self) -> Result<Vec<Store>> {
        Ok(self.db.list_stores().await?)
    }

    /// Get a store by id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the store does not exist.
    pub async fn get(&self, id: StoreId) -> Result<Store> {
        self.db
            .find_store(id)
            .await?
            .ok_or_else(|| AppError::not_found("Store"))
    }

    /// Whether a store already uses `domain` (after normalization).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a malformed domain.
    pub async fn domain_exists(&self, domain: &str) -> Result<bool> {
        let domain = StoreDomain::parse(domain)?;
        Ok(self.db.domain_exists(&domain).await?)
    }

    /// Create a store for an existing user.
    ///
    /// Only an `ADMIN` or the user themself may do this. A `CUSTOMER` or
    /// `EMPLOYEE` is promoted to `OWNER` in the same write.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AccessDenied` for anyone else,
    /// `AppError::NotFound` if the user does not exist, and
    /// `AppError::AlreadyExists` if the user already owns a store or the
    /// domain is taken.
    #[instrument(skip(self, actor, fields), fields(actor_id = %actor.id, user_id = %user_id))]
    pub async fn create_for_user(
        &self,
        actor: &Principal,
        user_id: UserId,
        fields: StoreFields,
    ) -> Result<Store> {
        if !actor.is_admin() && actor.id != user_id {
            return Err(AppError::AccessDenied);
        }

        let user = self
            .db
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        if user.owned_store_id.is_some() {
            return Err(AppError::AlreadyExists("store for this user".to_string()));
        }

        let fields = StoreFields {
            name: required_text("store name", &fields.name, MAX_STORE_NAME)?,
            ..fields
        };
        if self.db.domain_exists(&fields.domain).await? {
            return Err(AppError::AlreadyExists("domain".to_string()));
        }

        let promote = matches!(user.role, Role::Customer | Role::Employee);
        let store = self.db.insert_store(user_id, &fields, promote).await?;

        tracing::info!(store_id = %store.id, promoted = promote, "Store created");
        Ok(store)
    }

    /// Update name, domain and theme settings.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AccessDenied` unless the actor may modify the store.
    /// Returns `AppError::NotFound` if it does not exist, and
    /// `AppError::AlreadyExists` if the new domain is taken.
    #[instrument(skip(self, actor, update), fields(actor_id = %actor.id, store_id = %id))]
    pub async fn update(&self, actor: &Principal, id: StoreId, update: StoreUpdate) -> Result<Store> {
        ensure_can_modify(actor, id)?;
        let current = self.get(id).await?;
        let mut fields = StoreFields::from(&current);

        if let Some(name) = update.name {
            fields.name = required_text("store name", &name, MAX_STORE_NAME)?;
        }
        if let Some(domain) = update.domain {
            let domain = StoreDomain::parse(&domain)?;
            if domain != current.domain && self.db.domain_exists(&domain).await? {
                return Err(AppError::AlreadyExists("domain".to_string()));
            }
            fields.domain = domain;
        }
        if let Some(theme) = update.theme_settings {
            fields.theme_settings = theme;
        }

        let store = self.db.update_store(id, &fields).await?;
        tracing::info!("Store updated");
        Ok(store)
    }

    /// Replace the theme settings blob.
    ///
    /// # Errors
    ///
    /// Same as [`Self::update`].
    pub async fn update_theme(
        &self,
        actor: &Principal,
        id: StoreId,
        theme_settings: serde_json::Value,
    ) -> Result<Store> {
        self.update(
            actor,
            id,
            StoreUpdate {
                theme_settings: Some(theme_settings),
                ..StoreUpdate::default()
            },
        )
        .await
    }

    /// Delete a store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AccessDenied` unless the actor may modify the store,
    /// `AppError::NotFound` if it does not exist, and
    /// `AppError::ResourceInUse` while categories or products remain.
    #[instrument(skip(self, actor), fields(actor_id = %actor.id, store_id = %id))]
    pub async fn delete(&self, actor: &Principal, id: StoreId) -> Result<()> {
        ensure_can_modify(actor, id)?;
        self.get(id).await?;
        self.db.delete_store(id).await?;
        tracing::info!("Store deleted");
        Ok(())
    }
}
