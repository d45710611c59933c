//! Authentication service.
//!
//! Registration (customer, or owner together with a store), password login,
//! and token issuance.

mod error;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use token::{Claims, IssuedToken, TokenKeys};

use tracing::instrument;

use kiosky_core::{Email, Role};

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{NewUser, Store, StoreFields, UserRecord};

use super::required_text;

/// An authenticated account together with a freshly issued token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: UserRecord,
    pub token: IssuedToken,
}

/// Credentials and profile submitted at registration.
#[derive(Debug, Clone)]
pub struct Registration<'r> {
    pub full_name: &'r str,
    pub email: &'r str,
    pub password: &'r str,
}

/// Authentication service.
pub struct AuthService<'a> {
    db: &'a dyn Database,
    tokens: &'a TokenKeys,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(db: &'a dyn Database, tokens: &'a TokenKeys) -> Self {
        Self { db, tokens }
    }

    /// Register a `CUSTOMER` account and sign them in.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a bad email, name or weak password.
    /// Returns `AppError::AlreadyExists` if the email is already registered.
    #[instrument(skip(self, registration))]
    pub async fn register_customer(&self, registration: &Registration<'_>) -> Result<AuthSession> {
        let new_user = self.prepare_user(registration, Role::Customer).await?;
        let user = self.db.insert_user(&new_user).await?;

        tracing::info!(user_id = %user.id, "Customer registered");
        self.session_for(user)
    }

    /// Register an `OWNER` together with their store, atomically, and sign
    /// them in.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for bad input.
    /// Returns `AppError::AlreadyExists` if the email or domain is taken; in
    /// that case neither the account nor the store is created.
    #[instrument(skip(self, registration, store), fields(domain = %store.domain))]
    pub async fn register_owner(
        &self,
        registration: &Registration<'_>,
        store: StoreFields,
    ) -> Result<(AuthSession, Store)> {
        let store = StoreFields {
            name: required_text("store name", &store.name, 100)?,
            ..store
        };
        if self.db.domain_exists(&store.domain).await? {
            return Err(AppError::AlreadyExists("domain".to_string()));
        }

        let new_user = self.prepare_user(registration, Role::Owner).await?;
        let (user, store) = self.db.insert_owner_with_store(&new_user, &store).await?;

        tracing::info!(user_id = %user.id, store_id = %store.id, "Owner registered with store");
        Ok((self.session_for(user)?, store))
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidCredentials` if the email is unknown or the
    /// password is wrong. Both cases look identical to the caller.
    #[instrument(skip(self, email, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let Ok(email) = Email::parse(email) else {
            return Err(password::reject_unknown_account(password).into());
        };

        let Some(user) = self.db.find_user_by_email(&email).await? else {
            return Err(password::reject_unknown_account(password).into());
        };

        password::verify_password(password, &user.password_hash)?;

        tracing::info!(user_id = %user.id, "User logged in");
        self.session_for(user)
    }

    /// Whether an account exists for `email`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a malformed email.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let email = Email::parse(email)?;
        Ok(self.db.email_exists(&email).await?)
    }

    /// Validate a registration and hash its password.
    async fn prepare_user(&self, registration: &Registration<'_>, role: Role) -> Result<NewUser> {
        let email = Email::parse(registration.email)?;
        let full_name = required_text("full name", registration.full_name, 100)?;
        password::validate_password(registration.password)?;

        if self.db.email_exists(&email).await? {
            return Err(AppError::AlreadyExists("email".to_string()));
        }

        let password_hash = password::hash_password(registration.password)?;
        Ok(NewUser {
            email,
            full_name,
            password_hash,
            role,
        })
    }

    fn session_for(&self, user: UserRecord) -> Result<AuthSession> {
        let token = self.tokens.issue(&user.email, user.role).map_err(|e| {
            AppError::Internal(format!("failed to sign token: {e}"))
        })?;
        Ok(AuthSession { user, token })
    }
}
