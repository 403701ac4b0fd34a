//! Multi-tenant scoping
//!
//! Every storefront request belongs to exactly one tenant (a shop).
//!
//! ```text
//!   x-tenant-id header ──► TenantResolver ──► TenantContext ──► services ──► repositories
//!                              │                                              (filter by tenant)
//!                              ▼
//!                        TenantRegistry (exists? active?)
//! ```
//!
//! The [`TenantContext`] is an immutable value produced once per request by the
//! [`TenantResolver`] and handed to every service and repository call, so a
//! query without a tenant simply does not type-check.

#![warn(missing_docs)]

pub mod context;
pub mod model;
pub mod registry;
pub mod resolver;

use thiserror::Error;

pub use context::{TenantContext, TenantScoped};
pub use model::{NewTenant, Tenant, TenantStatus};
pub use registry::{InMemoryTenantRepository, TenantRegistry, TenantRepository};
pub use resolver::{TenantResolver, DEFAULT_TENANT_HEADER};

/// Tenant errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TenantError {
    /// Request carried no tenant header
    #[error("tenant header is missing")]
    MissingHeader,

    /// No tenant with this id or slug
    #[error("tenant not found: {0}")]
    NotFound(String),

    /// Tenant exists but may not serve requests
    #[error("tenant is not active")]
    Inactive,

    /// Slug or name rejected
    #[error("invalid tenant: {0}")]
    Invalid(String),

    /// Slug already taken
    #[error("tenant slug already exists: {0}")]
    Duplicate(String),

    /// Storage failure
    #[error("tenant storage error: {0}")]
    Storage(String),
}

impl From<shop_common::RepositoryError> for TenantError {
    fn from(err: shop_common::RepositoryError) -> Self {
        match err {
            shop_common::RepositoryError::NotFound => Self::NotFound("unknown".into()),
            shop_common::RepositoryError::Duplicate(key) => Self::Duplicate(key),
            other => Self::Storage(other.to_string()),
        }
    }
}
