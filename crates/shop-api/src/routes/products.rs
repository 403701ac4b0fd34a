//! Catalog endpoints
//!
//! Browsing is open to anyone in the tenant; changes need admin or manager.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use shop_commerce::{NewProduct, Product, ProductUpdate};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::middleware::{RoleGuard, Tenant};
use crate::models::{ApiResponse, ListParams, PaginatedResponse};
use crate::AppState;

pub fn router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let public = Router::new()
        .route("/", get(list_products))
        .route("/:id", get(get_product));

    let staff = super::restricted(
        Router::new()
            .route("/", post(create_product))
            .route("/all", get(list_all_products))
            .route("/:id", put(update_product).delete(delete_product))
            .route("/:id/stock", post(adjust_stock)),
        state,
        RoleGuard::staff(),
    );

    public.merge(staff)
}

#[derive(Debug, Deserialize)]
pub struct StockAdjustment {
    /// Signed change in units
    pub delta: i64,
}

async fn list_products(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Query(params): Query<ListParams>,
) -> ApiResult<PaginatedResponse<Product>> {
    let products = state.products.list(&ctx, params.page_request(), true).await?;
    Ok(Json(ApiResponse::success(products.into())))
}

/// Including deactivated products
async fn list_all_products(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Query(params): Query<ListParams>,
) -> ApiResult<PaginatedResponse<Product>> {
    let products = state.products.list(&ctx, params.page_request(), false).await?;
    Ok(Json(ApiResponse::success(products.into())))
}

async fn get_product(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> ApiResult<Product> {
    Ok(Json(ApiResponse::success(state.products.get(&ctx, id).await?)))
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Json(body): Json<NewProduct>,
) -> ApiResult<Product> {
    Ok(Json(ApiResponse::success(state.products.create(&ctx, body).await?)))
}

async fn update_product(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(body): Json<ProductUpdate>,
) -> ApiResult<Product> {
    Ok(Json(ApiResponse::success(state.products.update(&ctx, id, body).await?)))
}

async fn adjust_stock(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(body): Json<StockAdjustment>,
) -> ApiResult<Product> {
    Ok(Json(ApiResponse::success(state.products.adjust_stock(&ctx, id, body.delta).await?)))
}

/// Soft delete: the product is deactivated so past orders keep their lines
async fn delete_product(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> ApiResult<Product> {
    Ok(Json(ApiResponse::success(state.products.deactivate(&ctx, id).await?)))
}
