//! Header value → validated tenant context

use std::sync::Arc;
use uuid::Uuid;

use crate::context::TenantContext;
use crate::registry::TenantRepository;
use crate::TenantError;

/// Default header carrying the tenant id or slug
pub const DEFAULT_TENANT_HEADER: &str = "x-tenant-id";

/// Resolves the raw tenant header into a [`TenantContext`]
#[derive(Clone)]
pub struct TenantResolver {
    repo: Arc<dyn TenantRepository>,
}

impl TenantResolver {
    /// Resolver backed by the tenant store
    pub fn new(repo: Arc<dyn TenantRepository>) -> Self {
        Self { repo }
    }

    /// Validate the header value.
    ///
    /// A UUID is looked up by id, anything else by slug. The tenant must
    /// exist and be active.
    pub async fn resolve(&self, header: Option<&str>) -> Result<TenantContext, TenantError> {
        let raw = header
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(TenantError::MissingHeader)?;

        let tenant = match Uuid::parse_str(raw) {
            Ok(id) => self.repo.find_by_id(id).await?,
            Err(_) => self.repo.find_by_slug(&raw.to_lowercase()).await?,
        }
        .ok_or_else(|| TenantError::NotFound(raw.to_string()))?;

        if !tenant.is_active() {
            tracing::warn!(tenant_id = %tenant.id, status = ?tenant.status, "request for inactive tenant");
            return Err(TenantError::Inactive);
        }

        Ok(TenantContext::new(tenant.id))
    }
}
