//! Checkout, order history and payments

use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use shop_commerce::{CheckoutCommand, CommerceError, Order, OrderStatus, Payment};
use shop_common::{OrderId, PageRequest, PaymentId};
use std::sync::Arc;

use crate::error::ApiResult;
use crate::middleware::{AuthUser, RoleGuard, Tenant};
use crate::models::{ApiResponse, ListParams, PaginatedResponse};
use crate::AppState;

pub fn router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let customer = super::authenticated(
        Router::new()
            .route("/", post(checkout).get(my_orders))
            .route("/:id", get(get_order))
            .route("/:id/cancel", post(cancel_order))
            .route("/:id/payments", post(pay_order).get(list_payments))
            .route("/:id/payments/:payment_id", get(get_payment)),
        state,
    );

    let staff = super::restricted(
        Router::new()
            .route("/all", get(all_orders))
            .route("/:id/status", put(update_status)),
        state,
        RoleGuard::staff(),
    );

    customer.merge(staff)
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub promo_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AllOrdersParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    /// Payment method token
    pub method: String,
}

async fn checkout(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    user: AuthUser,
    body: Option<Json<CheckoutRequest>>,
) -> ApiResult<Order> {
    let Json(body) = body.unwrap_or_default();
    let cmd = CheckoutCommand {
        user_id: user.id,
        customer_email: user.email.clone(),
        promo_code: body.promo_code.filter(|c| !c.trim().is_empty()),
    };
    Ok(Json(ApiResponse::success(state.orders.checkout(&ctx, cmd).await?)))
}

async fn my_orders(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    user: AuthUser,
    Query(params): Query<ListParams>,
) -> ApiResult<PaginatedResponse<Order>> {
    let page = state.orders.list_for_user(&ctx, user.id, params.page_request()).await?;
    Ok(Json(ApiResponse::success(page.into())))
}

async fn all_orders(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Query(params): Query<AllOrdersParams>,
) -> ApiResult<PaginatedResponse<Order>> {
    let page = PageRequest::new(params.page, params.per_page);
    let orders = state.orders.list_all(&ctx, params.status, page).await?;
    Ok(Json(ApiResponse::success(orders.into())))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    user: AuthUser,
    Path(id): Path<OrderId>,
) -> ApiResult<Order> {
    Ok(Json(ApiResponse::success(state.orders.get(&ctx, id, user.viewer()).await?)))
}

async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    user: AuthUser,
    Path(id): Path<OrderId>,
) -> ApiResult<Order> {
    Ok(Json(ApiResponse::success(state.orders.cancel(&ctx, id, user.viewer()).await?)))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusUpdate>,
) -> ApiResult<Order> {
    Ok(Json(ApiResponse::success(state.orders.update_status(&ctx, id, body.status).await?)))
}

async fn pay_order(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    user: AuthUser,
    Path(id): Path<OrderId>,
    Json(body): Json<PaymentRequest>,
) -> ApiResult<Payment> {
    let payment = state.payments.pay(&ctx, id, user.viewer(), &body.method).await?;
    Ok(Json(ApiResponse::success(payment)))
}

async fn list_payments(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    user: AuthUser,
    Path(id): Path<OrderId>,
) -> ApiResult<Vec<Payment>> {
    Ok(Json(ApiResponse::success(state.payments.list_for_order(&ctx, id, user.viewer()).await?)))
}

async fn get_payment(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    user: AuthUser,
    Path((order_id, payment_id)): Path<(OrderId, PaymentId)>,
) -> ApiResult<Payment> {
    let payment = state.payments.get(&ctx, payment_id, user.viewer()).await?;
    if payment.order_id != order_id {
        return Err(CommerceError::NotFound("payment").into());
    }
    Ok(Json(ApiResponse::success(payment)))
}
