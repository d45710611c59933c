//! User role management.

use kiosky_api::db::UserRepository;
use kiosky_api::error::AppError;
use kiosky_api::services::UserService;
use kiosky_core::{Email, Role, StoreId};

use super::{CliError, database};

/// Change the role of the account with `email`.
///
/// # Errors
///
/// Returns an error for an unknown role or account, `employee` without a
/// store, or demoting a user who still owns a store.
pub async fn set_role(email: &str, role: &str, store: Option<i64>) -> Result<(), CliError> {
    let role: Role = role
        .parse()
        .map_err(|_| CliError::InvalidRole(role.to_owned()))?;
    let email = Email::parse(email).map_err(AppError::from)?;

    let db = database().await?;
    let user = db
        .find_user_by_email(&email)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| CliError::UserNotFound(email.to_string()))?;

    let user = UserService::new(&db)
        .assign_role(user.id, role, store.map(StoreId::new))
        .await?;

    tracing::info!(
        "Role updated! Email: {}, Role: {}, Workplace: {:?}",
        user.email,
        user.role,
        user.employed_at_store_id
    );
    Ok(())
}
