//! Tenant management for the platform operator
//!
//! Not tenant-scoped; every call needs the `x-platform-key` header.

use axum::extract::{Path, Request, State};
use axum::middleware::{from_fn_with_state, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use shop_identity::User;
use shop_tenant::{NewTenant, Tenant, TenantContext};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::ApiResponse;
use crate::AppState;

/// Header carrying the platform key
pub const PLATFORM_KEY_HEADER: &str = "x-platform-key";

pub fn router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/tenants", get(list_tenants).post(create_tenant))
        .route("/tenants/:id", get(get_tenant).put(rename_tenant))
        .route("/tenants/:id/activate", post(activate_tenant))
        .route("/tenants/:id/suspend", post(suspend_tenant))
        .route("/tenants/:id/deactivate", post(deactivate_tenant))
        .route("/tenants/:id/admins", post(create_admin))
        .route_layer(from_fn_with_state(Arc::clone(state), platform_key_middleware))
}

async fn platform_key_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let expected = state.config.platform_key.as_bytes();
    if expected.is_empty() {
        return Err(ApiError::Forbidden("platform API is disabled".into()));
    }

    let provided = request
        .headers()
        .get(PLATFORM_KEY_HEADER)
        .map(|v| v.as_bytes())
        .unwrap_or_default();
    if !keys_match(provided, expected) {
        tracing::warn!(path = %request.uri().path(), "platform call with bad key");
        return Err(ApiError::Unauthorized("invalid platform key".into()));
    }
    Ok(next.run(request).await)
}

fn keys_match(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// First admin of a tenant
#[derive(Debug, Deserialize)]
pub struct AdminAccount {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTenantRequest {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub admin: Option<AdminAccount>,
}

#[derive(Debug, Serialize)]
pub struct TenantCreated {
    pub tenant: Tenant,
    pub admin: Option<User>,
}

#[derive(Debug, Deserialize)]
pub struct RenameTenantRequest {
    pub name: String,
}

async fn create_tenant(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTenantRequest>,
) -> ApiResult<TenantCreated> {
    let tenant = state
        .tenants
        .create(NewTenant { slug: body.slug, name: body.name })
        .await?;

    let admin = match body.admin {
        Some(account) => Some(bootstrap_admin(&state, tenant.id, account).await?),
        None => None,
    };
    Ok(Json(ApiResponse::success(TenantCreated { tenant, admin })))
}

async fn list_tenants(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Tenant>> {
    Ok(Json(ApiResponse::success(state.tenants.list().await?)))
}

async fn get_tenant(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult<Tenant> {
    Ok(Json(ApiResponse::success(state.tenants.get(id).await?)))
}

async fn rename_tenant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<RenameTenantRequest>,
) -> ApiResult<Tenant> {
    Ok(Json(ApiResponse::success(state.tenants.rename(id, &body.name).await?)))
}

async fn activate_tenant(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult<Tenant> {
    Ok(Json(ApiResponse::success(state.tenants.activate(id).await?)))
}

async fn suspend_tenant(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult<Tenant> {
    Ok(Json(ApiResponse::success(state.tenants.suspend(id).await?)))
}

async fn deactivate_tenant(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult<Tenant> {
    Ok(Json(ApiResponse::success(state.tenants.deactivate(id).await?)))
}

/// Create or promote an admin in an existing tenant
async fn create_admin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(account): Json<AdminAccount>,
) -> ApiResult<User> {
    let tenant = state.tenants.get(id).await?;
    Ok(Json(ApiResponse::success(bootstrap_admin(&state, tenant.id, account).await?)))
}

async fn bootstrap_admin(state: &AppState, tenant_id: Uuid, account: AdminAccount) -> Result<User, ApiError> {
    let ctx = TenantContext::new(tenant_id);
    Ok(state
        .auth
        .bootstrap_admin(&ctx, &account.email, &account.name, &account.password)
        .await?)
}
