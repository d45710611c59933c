//! In-process [`Database`] for tests and local demos.
//!
//! Mirrors the `PostgreSQL` constraints: the same unique keys, the same
//! restrict-on-delete rules, and the same `ON DELETE SET NULL` for employee
//! workplaces. Every operation runs under one async mutex, so check-and-insert
//! is atomic just like a unique index.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use kiosky_core::{CategoryId, Email, ProductId, Role, Slug, StoreDomain, StoreId, UserId};

use super::{
    CategoryRepository, Database, ProductRepository, RepositoryError, StoreRepository,
    UserRepository,
};
use crate::models::{
    Category, CategoryFields, NewUser, Product, ProductFields, Store, StoreFields, UserChanges,
    UserRecord,
};

/// In-memory storage with `PostgreSQL`-equivalent constraints.
#[derive(Default)]
pub struct MemoryDatabase {
    tables: Mutex<Tables>,
}

impl MemoryDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Clone)]
struct StoredUser {
    id: UserId,
    email: Email,
    full_name: String,
    password_hash: String,
    role: Role,
    employed_at_store_id: Option<StoreId>,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    last_id: i64,
    users: BTreeMap<UserId, StoredUser>,
    stores: BTreeMap<StoreId, Store>,
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, Product>,
}

fn conflict(subject: &str) -> RepositoryError {
    RepositoryError::Conflict(subject.to_owned())
}

fn in_use(subject: &str) -> RepositoryError {
    RepositoryError::InUse(subject.to_owned())
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn record(&self, user: &StoredUser) -> UserRecord {
        UserRecord {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role,
            owned_store_id: self
                .stores
                .values()
                .find(|s| s.owner_id == user.id)
                .map(|s| s.id),
            employed_at_store_id: user.employed_at_store_id,
            created_at: user.created_at,
        }
    }

    fn user_record(&self, id: UserId) -> Result<UserRecord, RepositoryError> {
        self.users
            .get(&id)
            .map(|u| self.record(u))
            .ok_or(RepositoryError::NotFound)
    }

    fn ensure_email_free(&self, email: &Email, except: Option<UserId>) -> Result<(), RepositoryError> {
        if self
            .users
            .values()
            .any(|u| &u.email == email && Some(u.id) != except)
        {
            return Err(conflict("email"));
        }
        Ok(())
    }

    fn ensure_domain_free(
        &self,
        domain: &StoreDomain,
        except: Option<StoreId>,
    ) -> Result<(), RepositoryError> {
        if self
            .stores
            .values()
            .any(|s| &s.domain == domain && Some(s.id) != except)
        {
            return Err(conflict("domain"));
        }
        Ok(())
    }

    fn ensure_store_insertable(
        &self,
        owner_id: UserId,
        store: &StoreFields,
    ) -> Result<(), RepositoryError> {
        self.ensure_domain_free(&store.domain, None)?;
        if self.stores.values().any(|s| s.owner_id == owner_id) {
            return Err(conflict("store for this user"));
        }
        Ok(())
    }

    fn insert_user(&mut self, user: &NewUser) -> Result<UserId, RepositoryError> {
        self.ensure_email_free(&user.email, None)?;
        let id = UserId::new(self.next_id());
        self.users.insert(
            id,
            StoredUser {
                id,
                email: user.email.clone(),
                full_name: user.full_name.clone(),
                password_hash: user.password_hash.clone(),
                role: user.role,
                employed_at_store_id: None,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    fn insert_store(&mut self, owner_id: UserId, store: &StoreFields) -> Store {
        let id = StoreId::new(self.next_id());
        let store = Store {
            id,
            name: store.name.clone(),
            domain: store.domain.clone(),
            theme_settings: store.theme_settings.clone(),
            owner_id,
            created_at: Utc::now(),
        };
        self.stores.insert(id, store.clone());
        store
    }

    fn ensure_slug_free<'a>(
        mut existing: impl Iterator<Item = (&'a StoreId, &'a Slug, i64)>,
        store_id: StoreId,
        slug: &Slug,
        except: Option<i64>,
        subject: &str,
    ) -> Result<(), RepositoryError> {
        if existing.any(|(s, sl, id)| *s == store_id && sl == slug && Some(id) != except) {
            return Err(conflict(subject));
        }
        Ok(())
    }

    fn ensure_category_slug_free(
        &self,
        store_id: StoreId,
        slug: &Slug,
        except: Option<CategoryId>,
    ) -> Result<(), RepositoryError> {
        Self::ensure_slug_free(
            self.categories
                .values()
                .map(|c| (&c.store_id, &c.slug, c.id.as_i64())),
            store_id,
            slug,
            except.map(|id| id.as_i64()),
            "category slug",
        )
    }

    fn ensure_product_slug_free(
        &self,
        store_id: StoreId,
        slug: &Slug,
        except: Option<ProductId>,
    ) -> Result<(), RepositoryError> {
        Self::ensure_slug_free(
            self.products
                .values()
                .map(|p| (&p.store_id, &p.slug, p.id.as_i64())),
            store_id,
            slug,
            except.map(|id| id.as_i64()),
            "product slug",
        )
    }

    /// The composite `(category_id, store_id)` foreign key.
    fn ensure_category_in_store(&self, product: &ProductFields) -> Result<(), RepositoryError> {
        match self.categories.get(&product.category_id) {
            Some(category) if category.store_id == product.store_id => Ok(()),
            _ => Err(RepositoryError::NotFound),
        }
    }

    fn product_from_fields(
        id: ProductId,
        fields: &ProductFields,
        created_at: DateTime<Utc>,
    ) -> Product {
        Product {
            id,
            name: fields.name.clone(),
            slug: fields.slug.clone(),
            price: fields.price,
            description: fields.description.clone(),
            attributes: fields.attributes.clone(),
            images: fields.images.clone(),
            is_visible: fields.is_visible,
            category_id: fields.category_id,
            store_id: fields.store_id,
            created_at,
        }
    }

    fn products_where(&self, filter: impl Fn(&Product) -> bool) -> Vec<Product> {
        self.products
            .values()
            .filter(|p| filter(p))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl UserRepository for MemoryDatabase {
    async fn find_user(&self, id: UserId) -> Result<Option<UserRecord>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.get(&id).map(|u| tables.record(u)))
    }

    async fn find_user_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|u| &u.email == email)
            .map(|u| tables.record(u)))
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().map(|u| tables.record(u)).collect())
    }

    async fn email_exists(&self, email: &Email) -> Result<bool, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().any(|u| &u.email == email))
    }

    async fn insert_user(&self, user: &NewUser) -> Result<UserRecord, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let id = tables.insert_user(user)?;
        tables.user_record(id)
    }

    async fn update_user(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<UserRecord, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        if let Some(email) = &changes.email {
            tables.ensure_email_free(email, Some(id))?;
        }

        let user = tables.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(full_name) = &changes.full_name {
            user.full_name.clone_from(full_name);
        }
        if let Some(hash) = &changes.password_hash {
            user.password_hash.clone_from(hash);
        }
        tables.user_record(id)
    }

    async fn set_user_role(
        &self,
        id: UserId,
        role: Role,
        employed_at: Option<StoreId>,
    ) -> Result<UserRecord, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if let Some(store_id) = employed_at
            && !tables.stores.contains_key(&store_id)
        {
            return Err(RepositoryError::NotFound);
        }

        let user = tables.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        user.role = role;
        user.employed_at_store_id = employed_at;
        tables.user_record(id)
    }

    async fn delete_user(&self, id: UserId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.stores.values().any(|s| s.owner_id == id) {
            return Err(in_use("user still owns a store"));
        }
        tables.users.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl StoreRepository for MemoryDatabase {
    async fn list_stores(&self) -> Result<Vec<Store>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.stores.values().cloned().collect())
    }

    async fn find_store(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.stores.get(&id).cloned())
    }

    async fn domain_exists(&self, domain: &StoreDomain) -> Result<bool, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.stores.values().any(|s| &s.domain == domain))
    }

    async fn insert_owner_with_store(
        &self,
        owner: &NewUser,
        store: &StoreFields,
    ) -> Result<(UserRecord, Store), RepositoryError> {
        let mut tables = self.tables.lock().await;
        // Validate both rows before writing either.
        tables.ensure_email_free(&owner.email, None)?;
        tables.ensure_domain_free(&store.domain, None)?;

        let owner_id = tables.insert_user(owner)?;
        let store = tables.insert_store(owner_id, store);
        let user = tables.user_record(owner_id)?;
        Ok((user, store))
    }

    async fn insert_store(
        &self,
        owner_id: UserId,
        store: &StoreFields,
        promote_to_owner: bool,
    ) -> Result<Store, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&owner_id) {
            return Err(RepositoryError::NotFound);
        }
        tables.ensure_store_insertable(owner_id, store)?;

        let store = tables.insert_store(owner_id, store);
        if promote_to_owner && let Some(user) = tables.users.get_mut(&owner_id) {
            user.role = Role::Owner;
            user.employed_at_store_id = None;
        }
        Ok(store)
    }

    async fn update_store(
        &self,
        id: StoreId,
        fields: &StoreFields,
    ) -> Result<Store, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.stores.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        tables.ensure_domain_free(&fields.domain, Some(id))?;

        let store = tables.stores.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        store.name.clone_from(&fields.name);
        store.domain = fields.domain.clone();
        store.theme_settings = fields.theme_settings.clone();
        Ok(store.clone())
    }

    async fn delete_store(&self, id: StoreId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.stores.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.categories.values().any(|c| c.store_id == id) {
            return Err(in_use("store still has categories"));
        }
        if tables.products.values().any(|p| p.store_id == id) {
            return Err(in_use("store still has products"));
        }

        tables.stores.remove(&id);
        for user in tables.users.values_mut() {
            if user.employed_at_store_id == Some(id) {
                user.employed_at_store_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for MemoryDatabase {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.categories.values().cloned().collect())
    }

    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.categories.get(&id).cloned())
    }

    async fn list_categories_by_store(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<Category>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .categories
            .values()
            .filter(|c| c.store_id == store_id)
            .cloned()
            .collect())
    }

    async fn find_category_by_slug(
        &self,
        store_id: StoreId,
        slug: &Slug,
    ) -> Result<Option<Category>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .categories
            .values()
            .find(|c| c.store_id == store_id && &c.slug == slug)
            .cloned())
    }

    async fn insert_category(
        &self,
        fields: &CategoryFields,
    ) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.stores.contains_key(&fields.store_id) {
            return Err(RepositoryError::NotFound);
        }
        tables.ensure_category_slug_free(fields.store_id, &fields.slug, None)?;

        let id = CategoryId::new(tables.next_id());
        let category = Category {
            id,
            name: fields.name.clone(),
            slug: fields.slug.clone(),
            store_id: fields.store_id,
            created_at: Utc::now(),
        };
        tables.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: CategoryId,
        fields: &CategoryFields,
    ) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let store_id = tables
            .categories
            .get(&id)
            .map(|c| c.store_id)
            .ok_or(RepositoryError::NotFound)?;
        tables.ensure_category_slug_free(store_id, &fields.slug, Some(id))?;

        let category = tables
            .categories
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        category.name.clone_from(&fields.name);
        category.slug = fields.slug.clone();
        Ok(category.clone())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.categories.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.products.values().any(|p| p.category_id == id) {
            return Err(in_use("category still has products"));
        }
        tables.categories.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for MemoryDatabase {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.products_where(|_| true))
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.products.get(&id).cloned())
    }

    async fn list_products_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.products_where(|p| p.category_id == category_id))
    }

    async fn list_products_by_store(
        &self,
        store_id: StoreId,
        visible_only: bool,
    ) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.products_where(|p| p.store_id == store_id && (p.is_visible || !visible_only)))
    }

    async fn search_products(
        &self,
        store_id: StoreId,
        query: &str,
    ) -> Result<Vec<Product>, RepositoryError> {
        let needle = query.to_lowercase();
        let tables = self.tables.lock().await;
        Ok(tables.products_where(|p| {
            p.store_id == store_id && p.is_visible && p.name.to_lowercase().contains(&needle)
        }))
    }

    async fn list_products_in_price_range(
        &self,
        store_id: StoreId,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut products = tables.products_where(|p| {
            p.store_id == store_id && p.is_visible && (min..=max).contains(&p.price.amount())
        });
        products.sort_by_key(|p| (p.price, p.id));
        Ok(products)
    }

    async fn find_product_by_slug(
        &self,
        store_id: StoreId,
        slug: &Slug,
    ) -> Result<Option<Product>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .products
            .values()
            .find(|p| p.store_id == store_id && &p.slug == slug)
            .cloned())
    }

    async fn insert_product(&self, fields: &ProductFields) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.lock().await;
        tables.ensure_product_slug_free(fields.store_id, &fields.slug, None)?;
        tables.ensure_category_in_store(fields)?;

        let id = ProductId::new(tables.next_id());
        let product = Tables::product_from_fields(id, fields, Utc::now());
        tables.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        fields: &ProductFields,
    ) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let created_at = tables
            .products
            .get(&id)
            .map(|p| p.created_at)
            .ok_or(RepositoryError::NotFound)?;
        tables.ensure_product_slug_free(fields.store_id, &fields.slug, Some(id))?;
        tables.ensure_category_in_store(fields)?;

        let product = Tables::product_from_fields(id, fields, created_at);
        tables.products.insert(id, product.clone());
        Ok(product)
    }

    async fn set_product_visibility(
        &self,
        id: ProductId,
        visible: bool,
    ) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let product = tables
            .products
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        product.is_visible = visible;
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        tables
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
