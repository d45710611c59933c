//! User administration handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kiosky_core::{Role, StoreId, UserId};

use crate::error::{AppError, Result};
use crate::middleware::CurrentPrincipal;
use crate::models::UserRecord;
use crate::services::UserService;
use crate::services::users::UserUpdate;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}", get(show).put(update).delete(delete))
        .route("/{id}/role", put(set_role))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRoleRequest {
    /// Role name, case-insensitive.
    pub role: String,
    pub employed_at_store_id: Option<StoreId>,
}

/// A user account without its password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub owned_store_id: Option<StoreId>,
    pub employed_at_store_id: Option<StoreId>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email.into_inner(),
            role: user.role,
            owned_store_id: user.owned_store_id,
            employed_at_store_id: user.employed_at_store_id,
            created_at: user.created_at,
        }
    }
}

async fn list(
    CurrentPrincipal(actor): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>> {
    let users = UserService::new(state.db()).list(&actor).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

async fn show(
    CurrentPrincipal(actor): CurrentPrincipal,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<UserResponse>> {
    let user = UserService::new(state.db()).get(&actor, id).await?;
    Ok(Json(user.into()))
}

async fn update(
    CurrentPrincipal(actor): CurrentPrincipal,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    let update = UserUpdate {
        full_name: body.full_name,
        email: body.email,
        password: body.password,
    };
    let user = UserService::new(state.db()).update(&actor, id, update).await?;
    Ok(Json(user.into()))
}

async fn set_role(
    CurrentPrincipal(actor): CurrentPrincipal,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(body): Json<SetRoleRequest>,
) -> Result<Json<UserResponse>> {
    let role: Role = body
        .role
        .parse()
        .map_err(|e| AppError::Validation(format!("{e}")))?;
    let user = UserService::new(state.db())
        .set_role(&actor, id, role, body.employed_at_store_id)
        .await?;
    Ok(Json(user.into()))
}

async fn delete(
    CurrentPrincipal(actor): CurrentPrincipal,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<StatusCode> {
    UserService::new(state.db()).delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
