//! Store handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use serde::Deserialize;

use kiosky_core::{StoreDomain, StoreId, UserId};

use super::ExistsResponse;
use crate::error::Result;
use crate::middleware::CurrentPrincipal;
use crate::models::{Store, StoreFields};
use crate::services::StoreService;
use crate::services::stores::StoreUpdate;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/domain/exists", get(domain_exists))
        .route("/user/{user_id}", post(create_for_user))
        .route("/{id}", get(show).put(update).delete(delete))
        .route("/{id}/theme", patch(update_theme))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoreRequest {
    pub name: String,
    pub domain: String,
    #[serde(default)]
    pub theme_settings: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStoreRequest {
    pub name: Option<String>,
    pub domain: Option<String>,
    pub theme_settings: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct DomainQuery {
    pub domain: String,
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Store>>> {
    Ok(Json(StoreService::new(state.db()).list().await?))
}

async fn show(State(state): State<AppState>, Path(id): Path<StoreId>) -> Result<Json<Store>> {
    Ok(Json(StoreService::new(state.db()).get(id).await?))
}

async fn domain_exists(
    State(state): State<AppState>,
    Query(query): Query<DomainQuery>,
) -> Result<Json<ExistsResponse>> {
    let exists = StoreService::new(state.db())
        .domain_exists(&query.domain)
        .await?;
    Ok(Json(ExistsResponse { exists }))
}

async fn create_for_user(
    CurrentPrincipal(actor): CurrentPrincipal,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(body): Json<CreateStoreRequest>,
) -> Result<(StatusCode, Json<Store>)> {
    let fields = StoreFields {
        name: body.name,
        domain: StoreDomain::parse(&body.domain)?,
        theme_settings: body
            .theme_settings
            .unwrap_or_else(|| serde_json::json!({})),
    };
    let store = StoreService::new(state.db())
        .create_for_user(&actor, user_id, fields)
        .await?;
    Ok((StatusCode::CREATED, Json(store)))
}

async fn update(
    CurrentPrincipal(actor): CurrentPrincipal,
    State(state): State<AppState>,
    Path(id): Path<StoreId>,
    Json(body): Json<UpdateStoreRequest>,
) -> Result<Json<Store>> {
    let update = StoreUpdate {
        name: body.name,
        domain: body.domain,
        theme_settings: body.theme_settings,
    };
    Ok(Json(
        StoreService::new(state.db())
            .update(&actor, id, update)
            .await?,
    ))
}

async fn update_theme(
    CurrentPrincipal(actor): CurrentPrincipal,
    State(state): State<AppState>,
    Path(id): Path<StoreId>,
    Json(theme): Json<serde_json::Value>,
) -> Result<Json<Store>> {
    Ok(Json(
        StoreService::new(state.db())
            .update_theme(&actor, id, theme)
            .await?,
    ))
}

async fn delete(
    CurrentPrincipal(actor): CurrentPrincipal,
    State(state): State<AppState>,
    Path(id): Path<StoreId>,
) -> Result<StatusCode> {
    StoreService::new(state.db()).delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
