//! User account domain types.

use chrono::{DateTime, Utc};

use kiosky_core::{Email, Principal, Role, StoreId, UserId};

/// A persisted user account (domain type).
///
/// Carries the password hash, so it never leaves the service layer. Handlers
/// see a [`Principal`] or a response DTO instead.
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// Unique user ID.
    pub id: UserId,
    /// Login email, normalized.
    pub email: Email,
    /// Display name.
    pub full_name: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    /// Account role.
    pub role: Role,
    /// Store owned by this user, derived from `store.owner_id`.
    pub owned_store_id: Option<StoreId>,
    /// Store this user works at (employees only).
    pub employed_at_store_id: Option<StoreId>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// The acting identity for permission checks.
    #[must_use]
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role,
            owned_store_id: self.owned_store_id,
            employed_at_store_id: self.employed_at_store_id,
        }
    }
}

/// Data needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub full_name: String,
    pub password_hash: String,
    pub role: Role,
}

/// Profile changes. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<Email>,
    pub full_name: Option<String>,
    pub password_hash: Option<String>,
}
