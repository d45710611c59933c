//! Bearer-token authentication.
//!
//! [`authenticate`] runs on every request. It never rejects: a missing,
//! malformed, forged or expired token leaves the request anonymous. Handlers
//! that need an actor take a [`CurrentPrincipal`], which loads the principal
//! fresh from the database and rejects anonymous requests with `401`.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use kiosky_core::{Email, Principal};

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::{AuthError, TokenKeys};
use crate::services::principal::{Identity, PrincipalResolver};
use crate::state::AppState;

/// Middleware that binds an [`Identity`] for a valid bearer token.
///
/// An identity already bound by an outer layer is left alone.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.extensions().get::<Identity>().is_none()
        && let Some(identity) = identity_from_headers(request.headers(), state.tokens())
    {
        request.extensions_mut().insert(identity);
    }

    next.run(request).await
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn identity_from_headers(headers: &HeaderMap, tokens: &TokenKeys) -> Option<Identity> {
    let token = bearer_token(headers)?;

    let claims = match tokens.verify(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring invalid bearer token");
            return None;
        }
    };

    match Email::parse(&claims.sub) {
        Ok(subject) => Some(Identity { subject }),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring token with malformed subject");
            None
        }
    }
}

/// Extractor for the authenticated principal.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentPrincipal(principal): CurrentPrincipal) -> String {
///     format!("Hello, {}!", principal.full_name)
/// }
/// ```
pub struct CurrentPrincipal(pub Principal);

impl FromRequestParts<AppState> for CurrentPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let identity = parts.extensions.get::<Identity>().cloned();
        let resolver = PrincipalResolver::new(state.db());

        match resolver.current_principal(identity.as_ref()).await {
            Ok(principal) => {
                set_sentry_user(&principal.id, Some(principal.email.as_str()));
                Ok(Self(principal))
            }
            Err(AuthError::PrincipalNotFound) => {
                tracing::error!(
                    subject = identity.as_ref().map(|i| i.subject.as_str()),
                    "Verified token subject has no account"
                );
                Err(AppError::Unauthenticated)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, http::StatusCode, middleware, routing::get};
    use chrono::Utc;
    use tower::ServiceExt;

    use kiosky_core::Role;

    use super::*;
    use crate::db::UserRepository;
    use crate::models::NewUser;
    use crate::state::testing::memory_state;

    async fn whoami(CurrentPrincipal(principal): CurrentPrincipal) -> String {
        principal.email.to_string()
    }

    fn router(state: AppState) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn_with_state(state.clone(), authenticate))
            .with_state(state)
    }

    async fn status_with(state: AppState, authorization: Option<&str>) -> StatusCode {
        let mut request = axum::http::Request::builder().uri("/whoami");
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }
        router(state)
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    async fn seed_user(state: &AppState) -> Email {
        let email = Email::parse("a@x.com").unwrap();
        state
            .db()
            .insert_user(&NewUser {
                email: email.clone(),
                full_name: "A".to_string(),
                password_hash: "h".to_string(),
                role: Role::Customer,
            })
            .await
            .unwrap();
        email
    }

    #[tokio::test]
    async fn test_valid_token_resolves_principal() {
        let state = memory_state();
        let email = seed_user(&state).await;
        let token = state.tokens().issue(&email, Role::Customer).unwrap().token;

        let status = status_with(state, Some(&format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_anonymous_and_garbled_headers_are_unauthenticated() {
        let state = memory_state();
        seed_user(&state).await;

        for header in [None, Some("Bearer"), Some("Basic abc"), Some("Bearer not.a.jwt")] {
            assert_eq!(
                status_with(state.clone(), header).await,
                StatusCode::UNAUTHORIZED
            );
        }
    }

    #[tokio::test]
    async fn test_expired_token_is_unauthenticated() {
        let state = memory_state();
        let email = seed_user(&state).await;
        let issued_at = Utc::now() - chrono::Duration::seconds(3601);
        let token = state
            .tokens()
            .issue_at(&email, Role::Customer, issued_at)
            .unwrap()
            .token;

        let status = status_with(state, Some(&format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_token_for_deleted_account_is_unauthenticated() {
        let state = memory_state();
        let token = state
            .tokens()
            .issue(&Email::parse("ghost@x.com").unwrap(), Role::Admin)
            .unwrap()
            .token;

        let status = status_with(state, Some(&format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def"));
        headers.insert(AUTHORIZATION, "bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }
}
