//! Promo code endpoints

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use shop_commerce::{NewPromoCode, PromoCode, PromoCodeUpdate, PromoQuote, PromoStatus};
use shop_common::{Money, PromoCodeId};
use std::sync::Arc;

use crate::error::ApiResult;
use crate::middleware::{RoleGuard, Tenant};
use crate::models::{ApiResponse, ListParams, PaginatedResponse};
use crate::AppState;

pub fn router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let shoppers = super::authenticated(Router::new().route("/validate", post(validate_code)), state);

    let staff = super::restricted(
        Router::new()
            .route("/", get(list_codes).post(create_code))
            .route("/:id", get(get_code).put(update_code).delete(delete_code)),
        state,
        RoleGuard::staff(),
    );

    shoppers.merge(staff)
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub code: String,
    pub subtotal: Money,
}

/// Code with its current status
#[derive(Debug, Serialize)]
pub struct PromoCodeView {
    #[serde(flatten)]
    pub code: PromoCode,
    pub status: PromoStatus,
}

impl From<PromoCode> for PromoCodeView {
    fn from(code: PromoCode) -> Self {
        Self { status: code.status(chrono::Utc::now()), code }
    }
}

async fn validate_code(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Json(body): Json<ValidateRequest>,
) -> ApiResult<PromoQuote> {
    Ok(Json(ApiResponse::success(state.promo_codes.validate(&ctx, &body.code, &body.subtotal).await?)))
}

async fn list_codes(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Query(params): Query<ListParams>,
) -> ApiResult<PaginatedResponse<PromoCodeView>> {
    let page = state.promo_codes.list(&ctx, params.page_request()).await?.map(PromoCodeView::from);
    Ok(Json(ApiResponse::success(page.into())))
}

async fn create_code(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Json(body): Json<NewPromoCode>,
) -> ApiResult<PromoCodeView> {
    Ok(Json(ApiResponse::success(state.promo_codes.create(&ctx, body).await?.into())))
}

async fn get_code(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Path(id): Path<PromoCodeId>,
) -> ApiResult<PromoCodeView> {
    Ok(Json(ApiResponse::success(state.promo_codes.get(&ctx, id).await?.into())))
}

async fn update_code(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Path(id): Path<PromoCodeId>,
    Json(body): Json<PromoCodeUpdate>,
) -> ApiResult<PromoCodeView> {
    Ok(Json(ApiResponse::success(state.promo_codes.update(&ctx, id, body).await?.into())))
}

/// Codes are deactivated rather than removed; orders keep referring to them
async fn delete_code(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Path(id): Path<PromoCodeId>,
) -> ApiResult<PromoCodeView> {
    Ok(Json(ApiResponse::success(state.promo_codes.deactivate(&ctx, id).await?.into())))
}
