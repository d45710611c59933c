//! Registration, login and current-user handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kiosky_core::{Role, StoreDomain, StoreId, UserId};

use super::ExistsResponse;
use crate::error::Result;
use crate::middleware::CurrentPrincipal;
use crate::models::StoreFields;
use crate::services::{AuthService, AuthSession, Registration};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/register-owner", post(register_owner))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/email/exists", get(email_exists))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterOwnerRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub store_name: String,
    pub domain: String,
    #[serde(default)]
    pub theme_settings: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

/// Token plus the account it was issued for.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: &'static str,
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub store_id: Option<StoreId>,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl LoginResponse {
    fn new(message: &'static str, session: AuthSession) -> Self {
        let AuthSession { user, token } = session;
        Self {
            message,
            id: user.id,
            full_name: user.full_name,
            email: user.email.into_inner(),
            role: user.role,
            store_id: user.owned_store_id.or(user.employed_at_store_id),
            token: token.token,
            expires_at: token.expires_at,
        }
    }
}

/// The authenticated user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    /// Owned store for owners, workplace for employees.
    pub store_id: Option<StoreId>,
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<LoginResponse>)> {
    let service = AuthService::new(state.db(), state.tokens());
    let session = service
        .register_customer(&Registration {
            full_name: &body.full_name,
            email: &body.email,
            password: &body.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LoginResponse::new("Registration successful", session)),
    ))
}

async fn register_owner(
    State(state): State<AppState>,
    Json(body): Json<RegisterOwnerRequest>,
) -> Result<(StatusCode, Json<LoginResponse>)> {
    let store = StoreFields {
        name: body.store_name,
        domain: StoreDomain::parse(&body.domain)?,
        theme_settings: body
            .theme_settings
            .unwrap_or_else(|| serde_json::json!({})),
    };

    let service = AuthService::new(state.db(), state.tokens());
    let (session, _store) = service
        .register_owner(
            &Registration {
                full_name: &body.full_name,
                email: &body.email,
                password: &body.password,
            },
            store,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LoginResponse::new("Store registration successful", session)),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let service = AuthService::new(state.db(), state.tokens());
    let session = service.login(&body.email, &body.password).await?;
    Ok(Json(LoginResponse::new("Login successful", session)))
}

async fn me(CurrentPrincipal(principal): CurrentPrincipal) -> Json<MeResponse> {
    Json(MeResponse {
        id: principal.id,
        store_id: principal.owned_store_id.or(principal.employed_at_store_id),
        full_name: principal.full_name,
        email: principal.email.into_inner(),
        role: principal.role,
    })
}

async fn email_exists(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<ExistsResponse>> {
    let service = AuthService::new(state.db(), state.tokens());
    let exists = service.email_exists(&query.email).await?;
    Ok(Json(ExistsResponse { exists }))
}
