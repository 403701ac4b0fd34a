//! User endpoints

use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use shop_identity::{Role, User};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::middleware::{AuthUser, RoleGuard, Tenant};
use crate::models::{ApiResponse, ListParams, PaginatedResponse};
use crate::AppState;

pub fn router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let own = super::authenticated(Router::new().route("/me", get(me)), state);

    let admin = super::restricted(
        Router::new()
            .route("/", get(list_users))
            .route("/:id", get(get_user))
            .route("/:id/roles", put(set_roles))
            .route("/:id/active", put(set_active)),
        state,
        RoleGuard::admin(),
    );

    own.merge(admin)
}

#[derive(Debug, Deserialize)]
pub struct SetRolesRequest {
    pub roles: Vec<Role>,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

async fn me(State(state): State<Arc<AppState>>, Tenant(ctx): Tenant, user: AuthUser) -> ApiResult<User> {
    Ok(Json(ApiResponse::success(state.users.get(&ctx, user.id).await?)))
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Query(params): Query<ListParams>,
) -> ApiResult<PaginatedResponse<User>> {
    let page = state.users.list(&ctx, params.page_request()).await?;
    Ok(Json(ApiResponse::success(page.into())))
}

async fn get_user(State(state): State<Arc<AppState>>, Tenant(ctx): Tenant, Path(id): Path<Uuid>) -> ApiResult<User> {
    Ok(Json(ApiResponse::success(state.users.get(&ctx, id).await?)))
}

async fn set_roles(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(body): Json<SetRolesRequest>,
) -> ApiResult<User> {
    Ok(Json(ApiResponse::success(state.users.set_roles(&ctx, id, body.roles).await?)))
}

async fn set_active(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(body): Json<SetActiveRequest>,
) -> ApiResult<User> {
    Ok(Json(ApiResponse::success(state.users.set_active(&ctx, id, body.active).await?)))
}
