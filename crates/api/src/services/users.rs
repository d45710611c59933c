//! User account administration.
//!
//! Users may read, edit and delete their own account. Everything else,
//! including role changes, needs `ADMIN`.

use tracing::instrument;

use kiosky_core::{Email, Principal, Role, StoreId, UserId, has_role_at_least};

use super::auth::password;
use super::required_text;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{UserChanges, UserRecord};

/// Requested profile changes. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// User service.
pub struct UserService<'a> {
    db: &'a dyn Database,
}

impl<'a> UserService<'a> {
    #[must_use]
    pub const fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// List all accounts.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AccessDenied` unless the actor is `ADMIN`.
    pub async fn list(&self, actor: &Principal) -> Result<Vec<UserRecord>> {
        ensure_admin(actor)?;
        Ok(self.db.list_users().await?)
    }

    /// Get an account.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AccessDenied` unless the actor is `ADMIN` or the
    /// account itself, and `AppError::NotFound` if it does not exist.
    pub async fn get(&self, actor: &Principal, id: UserId) -> Result<UserRecord> {
        ensure_self_or_admin(actor, id)?;
        self.find(id).await
    }

    /// Update name, email or password.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AccessDenied` unless the actor is `ADMIN` or the
    /// account itself, `AppError::Validation` for bad input, and
    /// `AppError::AlreadyExists` if the new email is taken.
    #[instrument(skip(self, actor, update), fields(actor_id = %actor.id, user_id = %id))]
    pub async fn update(
        &self,
        actor: &Principal,
        id: UserId,
        update: UserUpdate,
    ) -> Result<UserRecord> {
        ensure_self_or_admin(actor, id)?;
        let current = self.find(id).await?;

        let mut changes = UserChanges::default();
        if let Some(name) = update.full_name {
            changes.full_name = Some(required_text("full name", &name, 100)?);
        }
        if let Some(email) = update.email {
            let email = Email::parse(&email)?;
            if email != current.email {
                if self.db.email_exists(&email).await? {
                    return Err(AppError::AlreadyExists("email".to_string()));
                }
                changes.email = Some(email);
            }
        }
        if let Some(new_password) = update.password {
            password::validate_password(&new_password)?;
            changes.password_hash = Some(password::hash_password(&new_password)?);
        }

        let user = self.db.update_user(id, &changes).await?;
        tracing::info!(
            email_changed = changes.email.is_some(),
            password_changed = changes.password_hash.is_some(),
            "User updated"
        );
        Ok(user)
    }

    /// Change an account's role on behalf of an `ADMIN`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AccessDenied` unless the actor is `ADMIN`, otherwise
    /// the errors of [`Self::assign_role`].
    #[instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn set_role(
        &self,
        actor: &Principal,
        id: UserId,
        role: Role,
        employed_at: Option<StoreId>,
    ) -> Result<UserRecord> {
        ensure_admin(actor)?;
        self.assign_role(id, role, employed_at).await
    }

    /// Change an account's role without an acting principal. Used by the
    /// operator CLI.
    ///
    /// `EMPLOYEE` requires the store the user works at. Any other role clears
    /// the workplace. A user who owns a store keeps `OWNER` or `ADMIN` until
    /// the store is gone.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for `EMPLOYEE` without a store,
    /// `AppError::NotFound` if the user or store does not exist, and
    /// `AppError::ResourceInUse` when demoting a store owner.
    #[instrument(skip(self))]
    pub async fn assign_role(
        &self,
        id: UserId,
        role: Role,
        employed_at: Option<StoreId>,
    ) -> Result<UserRecord> {
        let current = self.find(id).await?;

        let employed_at = if role == Role::Employee {
            let store_id = employed_at.ok_or_else(|| {
                AppError::Validation("employee role requires a store id".to_string())
            })?;
            if self.db.find_store(store_id).await?.is_none() {
                return Err(AppError::not_found("Store"));
            }
            Some(store_id)
        } else {
            None
        };

        if current.owned_store_id.is_some() && !role.includes(Role::Owner) {
            return Err(AppError::ResourceInUse("user still owns a store".to_string()));
        }

        let user = self.db.set_user_role(id, role, employed_at).await?;
        tracing::info!(from = %current.role, to = %role, "User role changed");
        Ok(user)
    }

    /// Delete an account.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AccessDenied` unless the actor is `ADMIN` or the
    /// account itself, and `AppError::ResourceInUse` while the user owns a
    /// store.
    #[instrument(skip(self, actor), fields(actor_id = %actor.id, user_id = %id))]
    pub async fn delete(&self, actor: &Principal, id: UserId) -> Result<()> {
        ensure_self_or_admin(actor, id)?;
        self.find(id).await?;
        self.db.delete_user(id).await?;
        tracing::info!("User deleted");
        Ok(())
    }

    async fn find(&self, id: UserId) -> Result<UserRecord> {
        self.db
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }
}

fn ensure_admin(actor: &Principal) -> Result<()> {
    if has_role_at_least(Some(actor), Role::Admin) {
        Ok(())
    } else {
        tracing::info!(user_id = %actor.id, role = %actor.role, "Admin operation denied");
        Err(AppError::AccessDenied)
    }
}

fn ensure_self_or_admin(actor: &Principal, id: UserId) -> Result<()> {
    if actor.id == id {
        return Ok(());
    }
    ensure_admin(actor)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kiosky_core::StoreDomain;
    use serde_json::json;

    use super::*;
    use crate::db::{MemoryDatabase, StoreRepository, UserRepository};
    use crate::models::{NewUser, StoreFields};

    async fn user(db: &MemoryDatabase, email: &str, role: Role) -> Principal {
        db.insert_user(&NewUser {
            email: Email::parse(email).unwrap(),
            full_name: "Test".to_string(),
            password_hash: "h".to_string(),
            role,
        })
        .await
        .unwrap()
        .principal()
    }

    async fn owner_with_store(db: &MemoryDatabase) -> (Principal, StoreId) {
        let (owner, store) = db
            .insert_owner_with_store(
                &NewUser {
                    email: Email::parse("o@x.com").unwrap(),
                    full_name: "Owner".to_string(),
                    password_hash: "h".to_string(),
                    role: Role::Owner,
                },
                &StoreFields {
                    name: "Shop".to_string(),
                    domain: StoreDomain::parse("shop1").unwrap(),
                    theme_settings: json!({}),
                },
            )
            .await
            .unwrap();
        (owner.principal(), store.id)
    }

    #[tokio::test]
    async fn test_listing_requires_admin() {
        let db = MemoryDatabase::new();
        let customer = user(&db, "c@x.com", Role::Customer).await;
        let root = user(&db, "root@x.com", Role::Admin).await;
        let service = UserService::new(&db);

        assert!(matches!(
            service.list(&customer).await.unwrap_err(),
            AppError::AccessDenied
        ));
        assert_eq!(service.list(&root).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_users_manage_only_themselves() {
        let db = MemoryDatabase::new();
        let a = user(&db, "a@x.com", Role::Customer).await;
        let b = user(&db, "b@x.com", Role::Customer).await;
        let service = UserService::new(&db);

        assert!(service.get(&a, a.id).await.is_ok());
        assert!(matches!(
            service.get(&a, b.id).await.unwrap_err(),
            AppError::AccessDenied
        ));
        assert!(matches!(
            service.delete(&a, b.id).await.unwrap_err(),
            AppError::AccessDenied
        ));
    }

    #[tokio::test]
    async fn test_update_email_must_be_free() {
        let db = MemoryDatabase::new();
        let a = user(&db, "a@x.com", Role::Customer).await;
        user(&db, "b@x.com", Role::Customer).await;
        let service = UserService::new(&db);

        let err = service
            .update(
                &a,
                a.id,
                UserUpdate {
                    email: Some(" B@X.com ".to_string()),
                    ..UserUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));

        let updated = service
            .update(
                &a,
                a.id,
                UserUpdate {
                    full_name: Some("Alice".to_string()),
                    email: Some("A@x.com".to_string()),
                    password: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.full_name, "Alice");
    }

    #[tokio::test]
    async fn test_weak_new_password_is_rejected() {
        let db = MemoryDatabase::new();
        let a = user(&db, "a@x.com", Role::Customer).await;
        let err = UserService::new(&db)
            .update(
                &a,
                a.id,
                UserUpdate {
                    password: Some("short".to_string()),
                    ..UserUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_set_role_employee_needs_existing_store() {
        let db = MemoryDatabase::new();
        let root = user(&db, "root@x.com", Role::Admin).await;
        let c = user(&db, "c@x.com", Role::Customer).await;
        let (_, store_id) = owner_with_store(&db).await;
        let service = UserService::new(&db);

        let err = service
            .set_role(&root, c.id, Role::Employee, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service
            .set_role(&root, c.id, Role::Employee, Some(StoreId::new(999)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let employee = service
            .set_role(&root, c.id, Role::Employee, Some(store_id))
            .await
            .unwrap();
        assert_eq!(employee.employed_at_store_id, Some(store_id));
        assert_eq!(employee.owned_store_id, None);

        let customer = service
            .set_role(&root, c.id, Role::Customer, Some(store_id))
            .await
            .unwrap();
        assert_eq!(customer.employed_at_store_id, None);
    }

    #[tokio::test]
    async fn test_store_owner_cannot_be_demoted_or_deleted() {
        let db = MemoryDatabase::new();
        let root = user(&db, "root@x.com", Role::Admin).await;
        let (owner, _) = owner_with_store(&db).await;
        let service = UserService::new(&db);

        let err = service
            .set_role(&root, owner.id, Role::Customer, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ResourceInUse(_)));

        let err = service.delete(&owner, owner.id).await.unwrap_err();
        assert!(matches!(err, AppError::ResourceInUse(_)));
    }

    #[tokio::test]
    async fn test_only_admin_changes_roles() {
        let db = MemoryDatabase::new();
        let c = user(&db, "c@x.com", Role::Customer).await;
        let err = UserService::new(&db)
            .set_role(&c, c.id, Role::Admin, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AccessDenied));
    }
}
