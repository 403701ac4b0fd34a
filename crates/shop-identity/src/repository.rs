//! User storage port and in-memory adapter

use async_trait::async_trait;
use parking_lot::RwLock;
use shop_common::{Email, RepositoryError, UserId};
use shop_tenant::{TenantContext, TenantScoped};
use std::collections::HashMap;

use crate::model::User;

/// User repository; every call is scoped to one tenant
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find by id
    async fn find_by_id(&self, ctx: &TenantContext, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Find by email
    async fn find_by_email(&self, ctx: &TenantContext, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// All users of the tenant, oldest first
    async fn list(&self, ctx: &TenantContext) -> Result<Vec<User>, RepositoryError>;

    /// Insert; email must be unique inside the tenant
    async fn insert(&self, ctx: &TenantContext, user: &User) -> Result<(), RepositoryError>;

    /// Replace an existing user
    async fn update(&self, ctx: &TenantContext, user: &User) -> Result<(), RepositoryError>;
}

/// In-memory user store
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, ctx: &TenantContext, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().get(&id).filter(|u| u.belongs_to(ctx)).cloned())
    }

    async fn find_by_email(&self, ctx: &TenantContext, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.belongs_to(ctx) && &u.email == email)
            .cloned())
    }

    async fn list(&self, ctx: &TenantContext) -> Result<Vec<User>, RepositoryError> {
        let mut users: Vec<_> = self
            .users
            .read()
            .values()
            .filter(|u| u.belongs_to(ctx))
            .cloned()
            .collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn insert(&self, ctx: &TenantContext, user: &User) -> Result<(), RepositoryError> {
        if !user.belongs_to(ctx) {
            return Err(RepositoryError::Storage("user belongs to another tenant".into()));
        }
        let mut users = self.users.write();
        if users.values().any(|u| u.belongs_to(ctx) && u.email == user.email) {
            return Err(RepositoryError::Duplicate(user.email.to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, ctx: &TenantContext, user: &User) -> Result<(), RepositoryError> {
        let mut users = self.users.write();
        match users.get_mut(&user.id) {
            Some(existing) if existing.belongs_to(ctx) && user.belongs_to(ctx) => {
                *existing = user.clone();
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }
}
