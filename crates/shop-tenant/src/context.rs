//! Request-scoped tenant context

use serde::Serialize;
use shop_common::TenantId;

/// The tenant a request is operating on.
///
/// Produced by [`crate::TenantResolver`] after the tenant has been checked to
/// exist and be active. Repositories must filter every read and stamp every
/// write with [`TenantContext::tenant_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TenantContext {
    tenant_id: TenantId,
}

impl TenantContext {
    /// Wrap an already validated tenant id
    pub const fn new(tenant_id: TenantId) -> Self {
        Self { tenant_id }
    }

    /// Current tenant
    pub const fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Entities that belong to exactly one tenant
pub trait TenantScoped {
    /// Owning tenant
    fn tenant_id(&self) -> TenantId;

    /// Whether this entity is visible in `ctx`
    fn belongs_to(&self, ctx: &TenantContext) -> bool {
        self.tenant_id() == ctx.tenant_id()
    }
}
