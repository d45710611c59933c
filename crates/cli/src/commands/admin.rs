//! Admin account bootstrap.
//!
//! # Environment Variables
//!
//! - `KIOSKY_DATABASE_URL` - `PostgreSQL` connection string
//! - `KIOSKY_ADMIN_PASSWORD` - Password for the new admin (same policy as
//!   self-registration)

use secrecy::{ExposeSecret, SecretString};

use kiosky_api::db::UserRepository;
use kiosky_api::error::AppError;
use kiosky_api::models::NewUser;
use kiosky_api::services::auth::password;
use kiosky_core::{Email, Role, UserId};

use super::{CliError, database};

/// Create a new `ADMIN` account.
///
/// # Errors
///
/// Returns an error if the password variable is missing or weak, the email is
/// malformed or taken, or the database is unreachable.
pub async fn create(email: &str, name: &str) -> Result<UserId, CliError> {
    dotenvy::dotenv().ok();
    let password = std::env::var("KIOSKY_ADMIN_PASSWORD")
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("KIOSKY_ADMIN_PASSWORD"))?;

    let email = Email::parse(email).map_err(AppError::from)?;
    let full_name = name.trim();
    if full_name.is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()).into());
    }
    password::validate_password(password.expose_secret())
        .map_err(AppError::from)?;
    let password_hash = password::hash_password(password.expose_secret())
        .map_err(AppError::from)?;

    let db = database().await?;
    tracing::info!("Creating admin account: {}", email);

    let user = db
        .insert_user(&NewUser {
            email,
            full_name: full_name.to_owned(),
            password_hash,
            role: Role::Admin,
        })
        .await
        .map_err(AppError::from)?;

    tracing::info!(
        "Admin account created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(user.id)
}
