//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod user;

use kiosky_api::config::{ConfigError, get_database_url};
use kiosky_api::db::{PgDatabase, create_pool};
use kiosky_api::error::AppError;
use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid role: {0}. Valid roles: admin, owner, employee, customer")]
    InvalidRole(String),

    #[error("No user with email: {0}")]
    UserNotFound(String),

    #[error(transparent)]
    App(#[from] AppError),
}

/// Connect to the database named by `KIOSKY_DATABASE_URL` (or `DATABASE_URL`).
async fn connect() -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();
    let database_url = get_database_url("KIOSKY_DATABASE_URL")?;

    tracing::info!("Connecting to database...");
    Ok(create_pool(&database_url).await?)
}

async fn database() -> Result<PgDatabase, CliError> {
    Ok(PgDatabase::new(connect().await?))
}
