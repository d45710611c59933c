//! Business logic services.
//!
//! Every mutating operation follows the same order: load or derive the
//! target store id, ask the permission engine, then write.

pub mod auth;
pub mod categories;
pub mod principal;
pub mod products;
pub mod stores;
pub mod users;

use kiosky_core::{Decision, Principal, StoreId, authz};

use crate::error::{AppError, Result};

pub use auth::{AuthService, AuthSession, Registration};
pub use categories::CategoryService;
pub use principal::{Identity, PrincipalResolver};
pub use products::ProductService;
pub use stores::StoreService;
pub use users::UserService;

/// Fail with `AccessDenied` unless `actor` may modify `store_id`.
fn ensure_can_modify(actor: &Principal, store_id: StoreId) -> Result<()> {
    match authz::decide(Some(actor), store_id) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            tracing::info!(
                user_id = %actor.id,
                store_id = %store_id,
                reason = reason.as_str(),
                "Mutation denied"
            );
            Err(AppError::AccessDenied)
        }
    }
}

/// Error for a mutation whose target does not exist.
///
/// Only admins, who may touch every store, learn that the target is missing.
/// Everyone else gets the same answer as for a resource they may not modify.
fn missing_target(actor: &Principal, entity: &str) -> AppError {
    if actor.is_admin() {
        AppError::not_found(entity)
    } else {
        AppError::AccessDenied
    }
}

/// Trim a required text field and check its length.
fn required_text(field: &str, value: &str, max_chars: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    if trimmed.chars().count() > max_chars {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max_chars} characters"
        )));
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kiosky_core::{Email, Role, UserId};

    use super::*;

    fn actor(role: Role) -> Principal {
        Principal {
            id: UserId::new(1),
            email: Email::parse("actor@x.com").unwrap(),
            full_name: "Actor".to_string(),
            role,
            owned_store_id: None,
            employed_at_store_id: None,
        }
    }

    #[test]
    fn test_missing_target_hides_existence_from_non_admins() {
        assert!(matches!(
            missing_target(&actor(Role::Owner), "Category"),
            AppError::AccessDenied
        ));
        assert!(matches!(
            missing_target(&actor(Role::Admin), "Category"),
            AppError::NotFound(_)
        ));
    }

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("name", "  Shop ", 10).unwrap(), "Shop");
        assert!(required_text("name", "   ", 10).is_err());
        assert!(required_text("name", "abcdefghijk", 10).is_err());
    }
}
