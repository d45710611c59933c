//! HTTP middleware stack for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, new hub per request)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Bearer token (bind a verified `Identity` to the request)
//! 5. CORS (when origins are configured)
//! 6. Rate limiting on `/auth` (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{CurrentPrincipal, authenticate};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
