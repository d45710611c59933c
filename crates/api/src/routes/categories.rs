//! Category handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;

use kiosky_core::{CategoryId, StoreId};

use super::ExistsResponse;
use crate::error::Result;
use crate::middleware::CurrentPrincipal;
use crate::models::Category;
use crate::services::CategoryService;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).put(update).delete(delete))
        .route("/store/{store_id}", get(by_store))
        .route("/store/{store_id}/slug/{slug}", get(by_slug))
        .route("/store/{store_id}/slug/{slug}/exists", get(slug_exists))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: String,
    pub slug: String,
    pub store_id: StoreId,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(CategoryService::new(state.db()).list().await?))
}

async fn show(State(state): State<AppState>, Path(id): Path<CategoryId>) -> Result<Json<Category>> {
    Ok(Json(CategoryService::new(state.db()).get(id).await?))
}

async fn by_store(
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
) -> Result<Json<Vec<Category>>> {
    Ok(Json(
        CategoryService::new(state.db())
            .list_by_store(store_id)
            .await?,
    ))
}

async fn by_slug(
    State(state): State<AppState>,
    Path((store_id, slug)): Path<(StoreId, String)>,
) -> Result<Json<Category>> {
    Ok(Json(
        CategoryService::new(state.db())
            .get_by_slug(store_id, &slug)
            .await?,
    ))
}

async fn slug_exists(
    State(state): State<AppState>,
    Path((store_id, slug)): Path<(StoreId, String)>,
) -> Result<Json<ExistsResponse>> {
    let exists = CategoryService::new(state.db())
        .slug_exists(store_id, &slug)
        .await?;
    Ok(Json(ExistsResponse { exists }))
}

async fn create(
    CurrentPrincipal(actor): CurrentPrincipal,
    State(state): State<AppState>,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = CategoryService::new(state.db())
        .create(&actor, body.store_id, &body.name, &body.slug)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update(
    CurrentPrincipal(actor): CurrentPrincipal,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(body): Json<UpdateCategoryRequest>,
) -> Result<Json<Category>> {
    let category = CategoryService::new(state.db())
        .update(&actor, id, body.name.as_deref(), body.slug.as_deref())
        .await?;
    Ok(Json(category))
}

async fn delete(
    CurrentPrincipal(actor): CurrentPrincipal,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    CategoryService::new(state.db()).delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
