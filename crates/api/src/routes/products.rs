//! Product handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use kiosky_core::{CategoryId, ProductId, StoreId};

use super::ExistsResponse;
use crate::error::Result;
use crate::middleware::CurrentPrincipal;
use crate::models::Product;
use crate::services::ProductService;
use crate::services::products::{NewProduct, ProductUpdate};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).put(update).delete(delete))
        .route("/{id}/visibility", patch(set_visibility))
        .route("/category/{category_id}", get(by_category))
        .route("/store/{store_id}", get(by_store))
        .route("/store/{store_id}/visible", get(visible_by_store))
        .route("/store/{store_id}/search", get(search))
        .route("/store/{store_id}/price-range", get(price_range))
        .route("/store/{store_id}/slug/{slug}", get(by_slug))
        .route("/store/{store_id}/slug/{slug}/exists", get(slug_exists))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub attributes: Option<serde_json::Value>,
    #[serde(default)]
    pub images: Vec<String>,
    pub is_visible: Option<bool>,
    pub category_id: CategoryId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub attributes: Option<serde_json::Value>,
    pub images: Option<Vec<String>>,
    pub is_visible: Option<bool>,
    pub category_id: Option<CategoryId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRequest {
    pub is_visible: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PriceRangeQuery {
    pub min: Decimal,
    pub max: Decimal,
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(ProductService::new(state.db()).list().await?))
}

async fn show(State(state): State<AppState>, Path(id): Path<ProductId>) -> Result<Json<Product>> {
    Ok(Json(ProductService::new(state.db()).get(id).await?))
}

async fn by_category(
    State(state): State<AppState>,
    Path(category_id): Path<CategoryId>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(
        ProductService::new(state.db())
            .list_by_category(category_id)
            .await?,
    ))
}

async fn by_store(
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(
        ProductService::new(state.db())
            .list_by_store(store_id, false)
            .await?,
    ))
}

async fn visible_by_store(
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(
        ProductService::new(state.db())
            .list_by_store(store_id, true)
            .await?,
    ))
}

async fn search(
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(
        ProductService::new(state.db())
            .search(store_id, &query.name)
            .await?,
    ))
}

async fn price_range(
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
    Query(query): Query<PriceRangeQuery>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(
        ProductService::new(state.db())
            .list_by_price_range(store_id, query.min, query.max)
            .await?,
    ))
}

async fn by_slug(
    State(state): State<AppState>,
    Path((store_id, slug)): Path<(StoreId, String)>,
) -> Result<Json<Product>> {
    Ok(Json(
        ProductService::new(state.db())
            .get_by_slug(store_id, &slug)
            .await?,
    ))
}

async fn slug_exists(
    State(state): State<AppState>,
    Path((store_id, slug)): Path<(StoreId, String)>,
) -> Result<Json<ExistsResponse>> {
    let exists = ProductService::new(state.db())
        .slug_exists(store_id, &slug)
        .await?;
    Ok(Json(ExistsResponse { exists }))
}

async fn create(
    CurrentPrincipal(actor): CurrentPrincipal,
    State(state): State<AppState>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let input = NewProduct {
        name: body.name,
        slug: body.slug,
        price: body.price,
        description: body.description,
        attributes: body.attributes,
        images: body.images,
        is_visible: body.is_visible,
        category_id: body.category_id,
    };
    let product = ProductService::new(state.db()).create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update(
    CurrentPrincipal(actor): CurrentPrincipal,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<Product>> {
    let update = ProductUpdate {
        name: body.name,
        slug: body.slug,
        price: body.price,
        description: body.description,
        attributes: body.attributes,
        images: body.images,
        is_visible: body.is_visible,
        category_id: body.category_id,
    };
    Ok(Json(
        ProductService::new(state.db())
            .update(&actor, id, update)
            .await?,
    ))
}

async fn set_visibility(
    CurrentPrincipal(actor): CurrentPrincipal,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<VisibilityRequest>,
) -> Result<Json<Product>> {
    Ok(Json(
        ProductService::new(state.db())
            .set_visibility(&actor, id, body.is_visible)
            .await?,
    ))
}

async fn delete(
    CurrentPrincipal(actor): CurrentPrincipal,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    ProductService::new(state.db()).delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
