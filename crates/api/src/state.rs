//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::db::Database;
use crate::services::auth::TokenKeys;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds nothing mutable: principals and stores
/// are always read from the database.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    db: Arc<dyn Database>,
    tokens: TokenKeys,
}

impl AppState {
    /// Create a new application state. Token keys are derived from the
    /// configured secret and lifetime.
    #[must_use]
    pub fn new(config: ApiConfig, db: Arc<dyn Database>) -> Self {
        let tokens = TokenKeys::new(&config.jwt_secret, config.jwt_ttl);
        Self {
            inner: Arc::new(AppStateInner { config, db, tokens }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database.
    #[must_use]
    pub fn db(&self) -> &dyn Database {
        self.inner.db.as_ref()
    }

    /// Get the token signing and verification keys.
    #[must_use]
    pub fn tokens(&self) -> &TokenKeys {
        &self.inner.tokens
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;
    use crate::db::MemoryDatabase;

    /// State over an empty in-memory database, rate limiting off.
    pub(crate) fn memory_state() -> AppState {
        let config = ApiConfig {
            database_url: SecretString::from("postgres://unused"),
            host: [127, 0, 0, 1].into(),
            port: 0,
            jwt_secret: SecretString::from("kJ8#mN2$pQ5&rT9*vW3!xZ6@bC1%dF4^"),
            jwt_ttl: Duration::from_secs(3600),
            cors_origins: Vec::new(),
            auth_rate_limit: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        AppState::new(config, Arc::new(MemoryDatabase::new()))
    }
}
