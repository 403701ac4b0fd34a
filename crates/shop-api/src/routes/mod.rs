//! API Routes

pub mod auth;
pub mod cart;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod platform;
pub mod products;
pub mod promo_codes;
pub mod users;

use axum::middleware::from_fn_with_state;
use axum::Router;
use std::sync::Arc;

use crate::middleware::{auth_middleware, enforce_roles, RoleGuard};
use crate::AppState;

/// Require a signed-in user
pub(crate) fn authenticated(router: Router<Arc<AppState>>, state: &Arc<AppState>) -> Router<Arc<AppState>> {
    router.route_layer(from_fn_with_state(Arc::clone(state), auth_middleware))
}

/// Require a signed-in user holding one of the guard's roles
pub(crate) fn restricted(
    router: Router<Arc<AppState>>,
    state: &Arc<AppState>,
    guard: RoleGuard,
) -> Router<Arc<AppState>> {
    authenticated(router.route_layer(from_fn_with_state(guard, enforce_roles)), state)
}
