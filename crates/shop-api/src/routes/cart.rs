//! Shopping cart of the signed-in user

use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use shop_commerce::{Cart, CartItem, PromoQuote};
use shop_common::{Money, ProductId};
use std::sync::Arc;

use crate::error::ApiResult;
use crate::middleware::{AuthUser, Tenant};
use crate::models::ApiResponse;
use crate::AppState;

pub fn router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    super::authenticated(
        Router::new()
            .route("/", get(view_cart).delete(clear_cart))
            .route("/items", post(add_item))
            .route("/items/:product_id", put(set_quantity).delete(remove_item))
            .route("/promo", get(preview_promo)),
        state,
    )
}

/// Cart with computed totals
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub item_count: u32,
    pub subtotal: Money,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        Self {
            item_count: cart.item_count(),
            subtotal: cart.subtotal(),
            items: cart.items,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: u32,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct PromoParams {
    pub code: String,
}

async fn view_cart(State(state): State<Arc<AppState>>, Tenant(ctx): Tenant, user: AuthUser) -> ApiResult<CartView> {
    Ok(Json(ApiResponse::success(state.carts.view(&ctx, user.id).await?.into())))
}

async fn add_item(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    user: AuthUser,
    Json(body): Json<AddItemRequest>,
) -> ApiResult<CartView> {
    let cart = state.carts.add_item(&ctx, user.id, body.product_id, body.quantity).await?;
    Ok(Json(ApiResponse::success(cart.into())))
}

async fn set_quantity(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    user: AuthUser,
    Path(product_id): Path<ProductId>,
    Json(body): Json<SetQuantityRequest>,
) -> ApiResult<CartView> {
    let cart = state.carts.set_quantity(&ctx, user.id, product_id, body.quantity).await?;
    Ok(Json(ApiResponse::success(cart.into())))
}

async fn remove_item(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    user: AuthUser,
    Path(product_id): Path<ProductId>,
) -> ApiResult<CartView> {
    let cart = state.carts.remove_item(&ctx, user.id, product_id).await?;
    Ok(Json(ApiResponse::success(cart.into())))
}

async fn clear_cart(State(state): State<Arc<AppState>>, Tenant(ctx): Tenant, user: AuthUser) -> ApiResult<CartView> {
    state.carts.clear(&ctx, user.id).await?;
    Ok(Json(ApiResponse::success(Cart::new(ctx.tenant_id(), user.id).into())))
}

async fn preview_promo(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    user: AuthUser,
    Query(params): Query<PromoParams>,
) -> ApiResult<PromoQuote> {
    Ok(Json(ApiResponse::success(state.carts.preview_promo(&ctx, user.id, &params.code).await?)))
}
