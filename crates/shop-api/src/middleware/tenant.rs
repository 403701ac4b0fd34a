//! Tenant resolution

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use shop_tenant::{TenantContext, TenantError};
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;

/// Resolve the tenant header into a [`TenantContext`] request extension
pub async fn tenant_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(state.config.tenant_header.as_str())
        .and_then(|v| v.to_str().ok());

    let ctx = state.resolver.resolve(header).await.map_err(|e| {
        tracing::debug!(error = %e, "tenant resolution failed");
        e
    })?;

    tracing::Span::current().record("tenant_id", tracing::field::display(ctx.tenant_id()));
    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

/// Extractor for the resolved tenant
#[derive(Debug, Clone, Copy)]
pub struct Tenant(pub TenantContext);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Tenant {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .copied()
            .map(Tenant)
            .ok_or(ApiError::Tenant(TenantError::MissingHeader))
    }
}
