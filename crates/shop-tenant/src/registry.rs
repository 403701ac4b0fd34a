//! Tenant registry: storage port, in-memory adapter and lifecycle service

use async_trait::async_trait;
use parking_lot::RwLock;
use shop_common::{RepositoryError, TenantId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{NewTenant, Tenant, TenantStatus};
use crate::TenantError;

/// Tenant storage port
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Find by id
    async fn find_by_id(&self, id: TenantId) -> Result<Option<Tenant>, RepositoryError>;

    /// Find by slug
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>, RepositoryError>;

    /// All tenants, oldest first
    async fn list(&self) -> Result<Vec<Tenant>, RepositoryError>;

    /// Insert a new tenant; slug must be unique
    async fn insert(&self, tenant: &Tenant) -> Result<(), RepositoryError>;

    /// Replace an existing tenant
    async fn update(&self, tenant: &Tenant) -> Result<(), RepositoryError>;
}

/// In-memory tenant store
#[derive(Default)]
pub struct InMemoryTenantRepository {
    tenants: RwLock<HashMap<TenantId, Tenant>>,
}

impl InMemoryTenantRepository {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenantRepository for InMemoryTenantRepository {
    async fn find_by_id(&self, id: TenantId) -> Result<Option<Tenant>, RepositoryError> {
        Ok(self.tenants.read().get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>, RepositoryError> {
        Ok(self.tenants.read().values().find(|t| t.slug == slug).cloned())
    }

    async fn list(&self) -> Result<Vec<Tenant>, RepositoryError> {
        let mut tenants: Vec<_> = self.tenants.read().values().cloned().collect();
        tenants.sort_by_key(|t| t.created_at);
        Ok(tenants)
    }

    async fn insert(&self, tenant: &Tenant) -> Result<(), RepositoryError> {
        let mut tenants = self.tenants.write();
        if tenants.values().any(|t| t.slug == tenant.slug) {
            return Err(RepositoryError::Duplicate(tenant.slug.clone()));
        }
        tenants.insert(tenant.id, tenant.clone());
        Ok(())
    }

    async fn update(&self, tenant: &Tenant) -> Result<(), RepositoryError> {
        let mut tenants = self.tenants.write();
        match tenants.get_mut(&tenant.id) {
            Some(existing) => {
                *existing = tenant.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }
}

/// Tenant lifecycle management
#[derive(Clone)]
pub struct TenantRegistry {
    repo: Arc<dyn TenantRepository>,
}

impl TenantRegistry {
    /// Create a registry over a storage adapter
    pub fn new(repo: Arc<dyn TenantRepository>) -> Self {
        Self { repo }
    }

    /// Shared storage handle (used by the resolver)
    pub fn repository(&self) -> Arc<dyn TenantRepository> {
        Arc::clone(&self.repo)
    }

    /// Create a new active tenant
    pub async fn create(&self, request: NewTenant) -> Result<Tenant, TenantError> {
        let tenant = Tenant::create(request)?;
        self.repo.insert(&tenant).await?;
        tracing::info!(tenant_id = %tenant.id, slug = %tenant.slug, "tenant created");
        Ok(tenant)
    }

    /// Get tenant by id
    pub async fn get(&self, id: TenantId) -> Result<Tenant, TenantError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| TenantError::NotFound(id.to_string()))
    }

    /// Get tenant by slug
    pub async fn find_by_slug(&self, slug: &str) -> Result<Tenant, TenantError> {
        self.repo
            .find_by_slug(&slug.trim().to_lowercase())
            .await?
            .ok_or_else(|| TenantError::NotFound(slug.to_string()))
    }

    /// List all tenants
    pub async fn list(&self) -> Result<Vec<Tenant>, TenantError> {
        Ok(self.repo.list().await?)
    }

    /// Rename
    pub async fn rename(&self, id: TenantId, name: &str) -> Result<Tenant, TenantError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TenantError::Invalid("name cannot be empty".into()));
        }
        let mut tenant = self.get(id).await?;
        tenant.name = name.to_string();
        tenant.updated_at = chrono::Utc::now();
        self.repo.update(&tenant).await?;
        Ok(tenant)
    }

    /// Re-enable a suspended or inactive tenant
    pub async fn activate(&self, id: TenantId) -> Result<Tenant, TenantError> {
        self.transition(id, TenantStatus::Active).await
    }

    /// Suspend
    pub async fn suspend(&self, id: TenantId) -> Result<Tenant, TenantError> {
        self.transition(id, TenantStatus::Suspended).await
    }

    /// Deactivate
    pub async fn deactivate(&self, id: TenantId) -> Result<Tenant, TenantError> {
        self.transition(id, TenantStatus::Inactive).await
    }

    async fn transition(&self, id: TenantId, status: TenantStatus) -> Result<Tenant, TenantError> {
        let mut tenant = self.get(id).await?;
        let previous = tenant.status;
        tenant.set_status(status);
        self.repo.update(&tenant).await?;
        tracing::info!(tenant_id = %id, ?previous, ?status, "tenant status changed");
        Ok(tenant)
    }
}
