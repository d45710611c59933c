//! Principal resolution.
//!
//! Turns the verified token subject bound to a request into the full acting
//! principal. Always reads storage, so role and store changes apply on the
//! next request.

use tracing::instrument;

use kiosky_core::{Email, Principal};

use super::auth::AuthError;
use crate::db::Database;

/// Verified identity bound to a request by the bearer-token middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Token subject (account email).
    pub subject: Email,
}

/// Loads principals by token subject.
pub struct PrincipalResolver<'a> {
    db: &'a dyn Database,
}

impl<'a> PrincipalResolver<'a> {
    #[must_use]
    pub const fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// Load the principal for `email`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PrincipalNotFound` if no account has this email.
    #[instrument(skip(self), fields(subject = %email))]
    pub async fn resolve(&self, email: &Email) -> Result<Principal, AuthError> {
        self.db
            .find_user_by_email(email)
            .await?
            .map(|user| user.principal())
            .ok_or(AuthError::PrincipalNotFound)
    }

    /// Load the principal acting in the current request.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NoActivePrincipal` if no identity is bound, or
    /// `AuthError::PrincipalNotFound` if its subject no longer exists.
    pub async fn current_principal(
        &self,
        identity: Option<&Identity>,
    ) -> Result<Principal, AuthError> {
        let identity = identity.ok_or(AuthError::NoActivePrincipal)?;
        self.resolve(&identity.subject).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kiosky_core::Role;

    use super::*;
    use crate::db::{MemoryDatabase, UserRepository};
    use crate::models::NewUser;

    #[tokio::test]
    async fn test_resolve_loads_current_role() {
        let db = MemoryDatabase::new();
        let email = Email::parse("c@x.com").unwrap();
        let user = db
            .insert_user(&NewUser {
                email: email.clone(),
                full_name: "C".to_string(),
                password_hash: "h".to_string(),
                role: Role::Customer,
            })
            .await
            .unwrap();

        let resolver = PrincipalResolver::new(&db);
        assert_eq!(resolver.resolve(&email).await.unwrap().role, Role::Customer);

        db.set_user_role(user.id, Role::Admin, None).await.unwrap();
        assert_eq!(resolver.resolve(&email).await.unwrap().role, Role::Admin);
    }

    #[tokio::test]
    async fn test_unknown_subject() {
        let db = MemoryDatabase::new();
        let resolver = PrincipalResolver::new(&db);
        let err = resolver
            .resolve(&Email::parse("ghost@x.com").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::PrincipalNotFound));
    }

    #[tokio::test]
    async fn test_no_identity_bound() {
        let db = MemoryDatabase::new();
        let err = PrincipalResolver::new(&db)
            .current_principal(None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NoActivePrincipal));
    }
}
