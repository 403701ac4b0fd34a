//! Bearer token authentication

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use shop_commerce::Viewer;
use shop_identity::{AuthenticatedUser, IdentityError};
use std::ops::Deref;
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware::tenant::Tenant;
use crate::AppState;

/// Verify the access token and attach the user to the request
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))?;

    let user = state.auth.authenticate(&ctx, token).await.map_err(|e| {
        tracing::debug!(tenant_id = %ctx.tenant_id(), error = %e, "authentication failed");
        match e {
            IdentityError::TenantMismatch => ApiError::Forbidden("token was issued for a different tenant".into()),
            IdentityError::TokenExpired => ApiError::Identity(IdentityError::TokenExpired),
            IdentityError::UserInactive => ApiError::Identity(IdentityError::UserInactive),
            _ => ApiError::Identity(IdentityError::InvalidToken),
        }
    })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Extractor for the authenticated user
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthenticatedUser);

impl AuthUser {
    /// How order and payment services should scope lookups
    pub fn viewer(&self) -> Viewer {
        if self.0.is_staff() {
            Viewer::Staff
        } else {
            Viewer::Customer(self.0.id)
        }
    }
}

impl Deref for AuthUser {
    type Target = AuthenticatedUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| ApiError::Unauthorized("authentication required".into()))
    }
}
