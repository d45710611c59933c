//! Category service.

use tracing::instrument;

use kiosky_core::{CategoryId, Principal, Slug, StoreId};

use super::{ensure_can_modify, missing_target, required_text};
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Category, CategoryFields};

const MAX_CATEGORY_NAME: usize = 100;

/// Category service.
pub struct CategoryService<'a> {
    db: &'a dyn Database,
}

impl<'a> CategoryService<'a> {
    #[must_use]
    pub const fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// List all categories.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` on storage failure.
    pub async fn list(&self) -> Result<Vec<Category>> {
        Ok(self.db.list_categories().await?)
    }

    /// Get a category by id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the category does not exist.
    pub async fn get(&self, id: CategoryId) -> Result<Category> {
        self.db
            .find_category(id)
            .await?
            .ok_or_else(|| AppError::not_found("Category"))
    }

    /// List a store's categories.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` on storage failure.
    pub async fn list_by_store(&self, store_id: StoreId) -> Result<Vec<Category>> {
        Ok(self.db.list_categories_by_store(store_id).await?)
    }

    /// Get a category by store and slug.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a malformed slug and
    /// `AppError::NotFound` if there is no such category.
    pub async fn get_by_slug(&self, store_id: StoreId, slug: &str) -> Result<Category> {
        let slug = Slug::parse(slug)?;
        self.db
            .find_category_by_slug(store_id, &slug)
            .await?
            .ok_or_else(|| AppError::not_found("Category"))
    }

    /// Whether `slug` is already used by a category of the store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a malformed slug.
    pub async fn slug_exists(&self, store_id: StoreId, slug: &str) -> Result<bool> {
        let slug = Slug::parse(slug)?;
        Ok(self.db.find_category_by_slug(store_id, &slug).await?.is_some())
    }

    /// Create a category in `store_id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AccessDenied` unless the actor may modify the store,
    /// `AppError::NotFound` if the store does not exist, and
    /// `AppError::AlreadyExists` if the slug is taken in that store.
    #[instrument(skip(self, actor, name, slug), fields(actor_id = %actor.id, store_id = %store_id))]
    pub async fn create(
        &self,
        actor: &Principal,
        store_id: StoreId,
        name: &str,
        slug: &str,
    ) -> Result<Category> {
        ensure_can_modify(actor, store_id)?;
        if self.db.find_store(store_id).await?.is_none() {
            return Err(AppError::not_found("Store"));
        }

        let fields = CategoryFields {
            name: required_text("category name", name, MAX_CATEGORY_NAME)?,
            slug: Slug::parse(slug)?,
            store_id,
        };
        if self.db.find_category_by_slug(store_id, &fields.slug).await?.is_some() {
            return Err(AppError::AlreadyExists("category slug".to_string()));
        }

        let category = self.db.insert_category(&fields).await?;
        tracing::info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    /// Rename a category or change its slug. The store never changes.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AccessDenied` unless the actor may modify the
    /// category's store, which non-admins also get for a missing category.
    /// Returns `AppError::AlreadyExists` if the new slug is taken.
    #[instrument(skip(self, actor, name, slug), fields(actor_id = %actor.id, category_id = %id))]
    pub async fn update(
        &self,
        actor: &Principal,
        id: CategoryId,
        name: Option<&str>,
        slug: Option<&str>,
    ) -> Result<Category> {
        let current = self.load_for_mutation(actor, id).await?;

        let mut fields = CategoryFields {
            name: current.name.clone(),
            slug: current.slug.clone(),
            store_id: current.store_id,
        };
        if let Some(name) = name {
            fields.name = required_text("category name", name, MAX_CATEGORY_NAME)?;
        }
        if let Some(slug) = slug {
            let slug = Slug::parse(slug)?;
            if slug != current.slug
                && self
                    .db
                    .find_category_by_slug(current.store_id, &slug)
                    .await?
                    .is_some()
            {
                return Err(AppError::AlreadyExists("category slug".to_string()));
            }
            fields.slug = slug;
        }

        let category = self.db.update_category(id, &fields).await?;
        tracing::info!("Category updated");
        Ok(category)
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AccessDenied` unless the actor may modify the
    /// category's store, and `AppError::ResourceInUse` while it has products.
    #[instrument(skip(self, actor), fields(actor_id = %actor.id, category_id = %id))]
    pub async fn delete(&self, actor: &Principal, id: CategoryId) -> Result<()> {
        self.load_for_mutation(actor, id).await?;
        self.db.delete_category(id).await?;
        tracing::info!("Category deleted");
        Ok(())
    }

    /// Load a category and check the actor may modify its store.
    async fn load_for_mutation(&self, actor: &Principal, id: CategoryId) -> Result<Category> {
        let Some(category) = self.db.find_category(id).await? else {
            return Err(missing_target(actor, "Category"));
        };
        ensure_can_modify(actor, category.store_id)?;
        Ok(category)
    }
}
