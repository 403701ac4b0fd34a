//! Authentication and user management use cases

use chrono::Utc;
use serde::{Deserialize, Serialize};
use shop_common::{Email, Page, PageRequest, TenantId, UserId};
use shop_tenant::TenantContext;
use std::sync::Arc;

use crate::model::{NewUser, Role, User};
use crate::password::PasswordManager;
use crate::repository::UserRepository;
use crate::tokens::{TokenKind, TokenPair, TokenService};
use crate::IdentityError;

/// Self-service registration
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterCommand {
    /// Login email
    pub email: String,
    /// Display name
    pub name: String,
    /// Plain password
    pub password: String,
    /// Optional phone
    #[serde(default)]
    pub phone: Option<String>,
}

/// Operator-created user with explicit roles
#[derive(Debug, Clone, Deserialize)]
pub struct ProvisionUser {
    /// Login email
    pub email: String,
    /// Display name
    pub name: String,
    /// Plain password
    pub password: String,
    /// Roles; must not be empty
    pub roles: Vec<Role>,
}

/// Caller identity established from an access token
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// User id
    pub id: UserId,
    /// Tenant
    pub tenant_id: TenantId,
    /// Email
    pub email: String,
    /// Current roles
    pub roles: Vec<Role>,
}

impl AuthenticatedUser {
    /// True when the user holds at least one of `roles`
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.roles.contains(r))
    }

    /// Admin or manager
    pub fn is_staff(&self) -> bool {
        self.has_any_role(&[Role::Admin, Role::Manager])
    }
}

/// Registration, login and token lifecycle
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    passwords: PasswordManager,
    tokens: Arc<TokenService>,
}

impl AuthService {
    /// Wire the service
    pub fn new(users: Arc<dyn UserRepository>, passwords: PasswordManager, tokens: Arc<TokenService>) -> Self {
        Self { users, passwords, tokens }
    }

    /// Token service handle
    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    /// Register a customer account
    pub async fn register(&self, ctx: &TenantContext, cmd: RegisterCommand) -> Result<User, IdentityError> {
        self.create_user(ctx, cmd.email, cmd.name, cmd.phone, &cmd.password, vec![Role::Customer])
            .await
    }

    /// Create a user with explicit roles
    pub async fn provision(&self, ctx: &TenantContext, cmd: ProvisionUser) -> Result<User, IdentityError> {
        if cmd.roles.is_empty() {
            return Err(IdentityError::Validation("at least one role is required".into()));
        }
        self.create_user(ctx, cmd.email, cmd.name, None, &cmd.password, dedupe(cmd.roles))
            .await
    }

    /// Ensure an admin account exists for a freshly created tenant.
    ///
    /// An existing user with this email is promoted instead of recreated.
    pub async fn bootstrap_admin(
        &self,
        ctx: &TenantContext,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<User, IdentityError> {
        let email = parse_email(email)?;
        if let Some(mut existing) = self.users.find_by_email(ctx, &email).await? {
            if !existing.has_role(Role::Admin) {
                existing.roles.push(Role::Admin);
                self.users.update(ctx, &existing).await?;
            }
            return Ok(existing);
        }

        let user = self
            .provision(
                ctx,
                ProvisionUser {
                    email: email.to_string(),
                    name: name.to_string(),
                    password: password.to_string(),
                    roles: vec![Role::Admin],
                },
            )
            .await?;
        tracing::info!(tenant_id = %ctx.tenant_id(), user_id = %user.id, "bootstrap admin created");
        Ok(user)
    }

    /// Check credentials and open a session
    pub async fn login(
        &self,
        ctx: &TenantContext,
        email: &str,
        password: &str,
    ) -> Result<(User, TokenPair), IdentityError> {
        let email = Email::new(email).map_err(|_| IdentityError::InvalidCredentials)?;
        let Some(mut user) = self.users.find_by_email(ctx, &email).await? else {
            tracing::debug!(tenant_id = %ctx.tenant_id(), "login for unknown email");
            return Err(IdentityError::InvalidCredentials);
        };

        if !self.passwords.verify(password, &user.password_hash)? {
            tracing::warn!(tenant_id = %ctx.tenant_id(), user_id = %user.id, "login with wrong password");
            return Err(IdentityError::InvalidCredentials);
        }
        if !user.active {
            tracing::warn!(tenant_id = %ctx.tenant_id(), user_id = %user.id, "login for inactive user");
            return Err(IdentityError::InvalidCredentials);
        }

        user.last_login = Some(Utc::now());
        self.users.update(ctx, &user).await?;

        let pair = self.tokens.issue_pair(&user)?;
        tracing::info!(tenant_id = %ctx.tenant_id(), user_id = %user.id, "user logged in");
        Ok((user, pair))
    }

    /// Rotate a refresh token into a new pair
    pub async fn refresh(&self, ctx: &TenantContext, refresh_token: &str) -> Result<TokenPair, IdentityError> {
        let claims = self.tokens.verify(refresh_token, TokenKind::Refresh)?;
        if claims.tenant_id != ctx.tenant_id() {
            return Err(IdentityError::TenantMismatch);
        }
        self.tokens.consume_refresh(&claims)?;

        let user = self
            .users
            .find_by_id(ctx, claims.sub)
            .await?
            .ok_or(IdentityError::InvalidToken)?;
        if !user.active {
            return Err(IdentityError::UserInactive);
        }
        self.tokens.issue_pair(&user)
    }

    /// End every session of the user
    pub async fn logout(&self, ctx: &TenantContext, user_id: UserId) -> Result<usize, IdentityError> {
        let revoked = self.tokens.revoke_all(user_id);
        tracing::info!(tenant_id = %ctx.tenant_id(), %user_id, revoked, "user logged out");
        Ok(revoked)
    }

    /// Resolve a bearer access token to the current user
    pub async fn authenticate(
        &self,
        ctx: &TenantContext,
        access_token: &str,
    ) -> Result<AuthenticatedUser, IdentityError> {
        let claims = self.tokens.verify(access_token, TokenKind::Access)?;
        if claims.tenant_id != ctx.tenant_id() {
            return Err(IdentityError::TenantMismatch);
        }

        let user = self
            .users
            .find_by_id(ctx, claims.sub)
            .await?
            .ok_or(IdentityError::InvalidToken)?;
        if !user.active {
            return Err(IdentityError::UserInactive);
        }

        Ok(AuthenticatedUser {
            id: user.id,
            tenant_id: user.tenant_id,
            email: user.email.to_string(),
            roles: user.roles,
        })
    }

    async fn create_user(
        &self,
        ctx: &TenantContext,
        email: String,
        name: String,
        phone: Option<String>,
        password: &str,
        roles: Vec<Role>,
    ) -> Result<User, IdentityError> {
        let email = parse_email(&email)?;
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(IdentityError::Validation("name cannot be empty".into()));
        }
        PasswordManager::check_strength(password)?;

        if self.users.find_by_email(ctx, &email).await?.is_some() {
            return Err(IdentityError::EmailTaken(email.to_string()));
        }

        let hash = self.passwords.hash(password)?;
        let user = User::create(
            ctx.tenant_id(),
            NewUser { email, name, phone: phone.filter(|p| !p.trim().is_empty()), roles },
            hash,
        );
        self.users.insert(ctx, &user).await?;

        tracing::info!(tenant_id = %ctx.tenant_id(), user_id = %user.id, roles = ?user.roles, "user created");
        Ok(user)
    }
}

/// Administrative user operations
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
}

impl UserService {
    /// Wire the service
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }

    /// Get a user of this tenant
    pub async fn get(&self, ctx: &TenantContext, id: UserId) -> Result<User, IdentityError> {
        self.users
            .find_by_id(ctx, id)
            .await?
            .ok_or(IdentityError::UserNotFound)
    }

    /// Page through users
    pub async fn list(&self, ctx: &TenantContext, page: PageRequest) -> Result<Page<User>, IdentityError> {
        Ok(Page::from_vec(self.users.list(ctx).await?, page))
    }

    /// Replace roles
    pub async fn set_roles(&self, ctx: &TenantContext, id: UserId, roles: Vec<Role>) -> Result<User, IdentityError> {
        if roles.is_empty() {
            return Err(IdentityError::Validation("at least one role is required".into()));
        }
        let mut user = self.get(ctx, id).await?;
        user.roles = dedupe(roles);
        self.users.update(ctx, &user).await?;
        tracing::info!(tenant_id = %ctx.tenant_id(), user_id = %id, roles = ?user.roles, "roles changed");
        Ok(user)
    }

    /// Enable or disable; disabling also ends all sessions
    pub async fn set_active(&self, ctx: &TenantContext, id: UserId, active: bool) -> Result<User, IdentityError> {
        let mut user = self.get(ctx, id).await?;
        user.active = active;
        self.users.update(ctx, &user).await?;
        if !active {
            self.tokens.revoke_all(id);
        }
        tracing::info!(tenant_id = %ctx.tenant_id(), user_id = %id, active, "user activity changed");
        Ok(user)
    }
}

fn parse_email(raw: &str) -> Result<Email, IdentityError> {
    Email::new(raw).map_err(|e| IdentityError::Validation(e.to_string()))
}

fn dedupe(roles: Vec<Role>) -> Vec<Role> {
    let mut out = Vec::with_capacity(roles.len());
    for role in roles {
        if !out.contains(&role) {
            out.push(role);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::HashingCost;
    use crate::repository::InMemoryUserRepository;
    use crate::tokens::TokenConfig;
    use uuid::Uuid;

    fn services() -> (AuthService, UserService) {
        let users: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
        let tokens = Arc::new(TokenService::new(TokenConfig::default()));
        let passwords = PasswordManager::new(HashingCost { memory_kib: 64, iterations: 1 }).unwrap();
        (
            AuthService::new(Arc::clone(&users), passwords, Arc::clone(&tokens)),
            UserService::new(users, tokens),
        )
    }

    fn register_cmd(email: &str) -> RegisterCommand {
        RegisterCommand {
            email: email.into(),
            name: "Jane".into(),
            password: "password123".into(),
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let (auth, _) = services();
        let ctx = TenantContext::new(Uuid::new_v4());

        let user = auth.register(&ctx, register_cmd("Jane@Shop.io")).await.unwrap();
        assert_eq!(user.roles, vec![Role::Customer]);
        assert_eq!(user.email.as_str(), "jane@shop.io");

        let (logged_in, pair) = auth.login(&ctx, "jane@shop.io", "password123").await.unwrap();
        assert!(logged_in.last_login.is_some());

        let me = auth.authenticate(&ctx, &pair.access_token).await.unwrap();
        assert_eq!(me.id, user.id);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (auth, _) = services();
        let ctx = TenantContext::new(Uuid::new_v4());

        let mut weak = register_cmd("a@b.io");
        weak.password = "short".into();
        assert!(matches!(auth.register(&ctx, weak).await, Err(IdentityError::Validation(_))));

        auth.register(&ctx, register_cmd("a@b.io")).await.unwrap();
        assert!(matches!(
            auth.register(&ctx, register_cmd("a@b.io")).await,
            Err(IdentityError::EmailTaken(_))
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (auth, users) = services();
        let ctx = TenantContext::new(Uuid::new_v4());
        let user = auth.register(&ctx, register_cmd("a@b.io")).await.unwrap();

        let wrong = auth.login(&ctx, "a@b.io", "bad-password").await.unwrap_err();
        let unknown = auth.login(&ctx, "nobody@b.io", "password123").await.unwrap_err();
        assert_eq!(wrong, IdentityError::InvalidCredentials);
        assert_eq!(unknown, IdentityError::InvalidCredentials);

        users.set_active(&ctx, user.id, false).await.unwrap();
        let inactive = auth.login(&ctx, "a@b.io", "password123").await.unwrap_err();
        assert_eq!(inactive, IdentityError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_refresh_rotation_and_logout() {
        let (auth, _) = services();
        let ctx = TenantContext::new(Uuid::new_v4());
        let user = auth.register(&ctx, register_cmd("a@b.io")).await.unwrap();
        let (_, pair) = auth.login(&ctx, "a@b.io", "password123").await.unwrap();

        let rotated = auth.refresh(&ctx, &pair.refresh_token).await.unwrap();
        assert_eq!(
            auth.refresh(&ctx, &pair.refresh_token).await.unwrap_err(),
            IdentityError::InvalidToken
        );

        assert_eq!(auth.logout(&ctx, user.id).await.unwrap(), 1);
        assert!(auth.refresh(&ctx, &rotated.refresh_token).await.is_err());
    }

    #[tokio::test]
    async fn test_token_bound_to_tenant() {
        let (auth, _) = services();
        let ctx = TenantContext::new(Uuid::new_v4());
        let other = TenantContext::new(Uuid::new_v4());
        auth.register(&ctx, register_cmd("a@b.io")).await.unwrap();
        let (_, pair) = auth.login(&ctx, "a@b.io", "password123").await.unwrap();

        assert_eq!(
            auth.authenticate(&other, &pair.access_token).await.unwrap_err(),
            IdentityError::TenantMismatch
        );
        assert_eq!(
            auth.refresh(&other, &pair.refresh_token).await.unwrap_err(),
            IdentityError::TenantMismatch
        );
    }

    #[tokio::test]
    async fn test_roles_and_bootstrap_admin() {
        let (auth, users) = services();
        let ctx = TenantContext::new(Uuid::new_v4());

        let admin = auth.bootstrap_admin(&ctx, "root@shop.io", "Root", "password123").await.unwrap();
        assert!(admin.has_role(Role::Admin));

        let again = auth.bootstrap_admin(&ctx, "root@shop.io", "Root", "ignored-pass").await.unwrap();
        assert_eq!(again.id, admin.id);

        let customer = auth.register(&ctx, register_cmd("c@shop.io")).await.unwrap();
        let updated = users
            .set_roles(&ctx, customer.id, vec![Role::Manager, Role::Manager, Role::Customer])
            .await
            .unwrap();
        assert_eq!(updated.roles, vec![Role::Manager, Role::Customer]);
        assert!(users.set_roles(&ctx, customer.id, vec![]).await.is_err());

        let page = users.list(&ctx, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_deactivated_user_cannot_authenticate() {
        let (auth, users) = services();
        let ctx = TenantContext::new(Uuid::new_v4());
        let user = auth.register(&ctx, register_cmd("a@b.io")).await.unwrap();
        let (_, pair) = auth.login(&ctx, "a@b.io", "password123").await.unwrap();

        users.set_active(&ctx, user.id, false).await.unwrap();
        assert_eq!(
            auth.authenticate(&ctx, &pair.access_token).await.unwrap_err(),
            IdentityError::UserInactive
        );
    }
}
