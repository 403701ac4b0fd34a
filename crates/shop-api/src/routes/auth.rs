//! Registration, login, token refresh and logout

use axum::extract::State;
use axum::middleware::from_fn_with_state;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use shop_identity::{RegisterCommand, TokenPair, User};
use std::sync::Arc;

use crate::error::ApiResult;
use crate::middleware::{bruteforce_middleware, AuthUser, ClientIp, GuardLayer, GuardedRoute, Tenant};
use crate::models::ApiResponse;
use crate::AppState;

pub fn router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let guarded = |route| from_fn_with_state(GuardLayer::new(state, route), bruteforce_middleware);

    let public = Router::new()
        .route("/register", post(register).route_layer(guarded(GuardedRoute::Registration)))
        .route("/login", post(login).route_layer(guarded(GuardedRoute::Login)))
        .route("/refresh", post(refresh).route_layer(guarded(GuardedRoute::Refresh)));

    let session = super::authenticated(Router::new().route("/logout", post(logout)), state);

    public.merge(session)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub revoked_sessions: usize,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Json(body): Json<RegisterCommand>,
) -> ApiResult<User> {
    let user = state.auth.register(&ctx, body).await?;
    state.notifications.user_registered(&ctx, &user).await;
    Ok(Json(ApiResponse::success(user)))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    ClientIp(ip): ClientIp,
    Json(body): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let (user, tokens) = state.auth.login(&ctx, &body.email, &body.password).await?;
    state.bruteforce.reset(ctx.tenant_id(), GuardedRoute::Login, &ip);
    Ok(Json(ApiResponse::success(LoginResponse { user, tokens })))
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Json(body): Json<RefreshRequest>,
) -> ApiResult<TokenPair> {
    Ok(Json(ApiResponse::success(state.auth.refresh(&ctx, &body.refresh_token).await?)))
}

async fn logout(State(state): State<Arc<AppState>>, Tenant(ctx): Tenant, user: AuthUser) -> ApiResult<LogoutResponse> {
    let revoked_sessions = state.auth.logout(&ctx, user.id).await?;
    Ok(Json(ApiResponse::success(LogoutResponse { revoked_sessions })))
}
