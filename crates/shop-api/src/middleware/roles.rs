//! Role checks for route groups

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use shop_identity::{AuthenticatedUser, Role};
use std::sync::Arc;

use crate::error::ApiError;

/// Roles a route group requires; holding any one of them is enough
#[derive(Debug, Clone)]
pub struct RoleGuard {
    roles: Arc<[Role]>,
}

impl RoleGuard {
    pub fn any_of(roles: &[Role]) -> Self {
        Self { roles: roles.into() }
    }

    pub fn admin() -> Self {
        Self::any_of(&[Role::Admin])
    }

    /// Admin or manager
    pub fn staff() -> Self {
        Self::any_of(&[Role::Admin, Role::Manager])
    }

    pub fn allows(&self, user: &AuthenticatedUser) -> bool {
        user.has_any_role(&self.roles)
    }
}

/// Runs after `auth_middleware`
pub async fn enforce_roles(State(guard): State<RoleGuard>, request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::Unauthorized("authentication required".into()))?;

    if !guard.allows(user) {
        tracing::warn!(
            tenant_id = %user.tenant_id,
            user_id = %user.id,
            required = ?guard.roles,
            path = %request.uri().path(),
            "role check failed"
        );
        return Err(ApiError::Forbidden("insufficient role".into()));
    }
    Ok(next.run(request).await)
}
