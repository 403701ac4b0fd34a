//! User and role model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shop_common::{Email, TenantId, UserId};
use shop_tenant::TenantScoped;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Role held by a user inside one tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full control of the shop
    Admin,
    /// Catalog, orders and promotions
    Manager,
    /// Shopper
    Customer,
}

impl Role {
    /// Stable lower-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Customer => "customer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "customer" => Ok(Self::Customer),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A user account
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// User ID
    pub id: UserId,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Login email, unique per tenant
    pub email: Email,
    /// Display name
    pub name: String,
    /// Optional phone number for SMS notifications
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub(crate) password_hash: String,
    /// Granted roles, never empty
    pub roles: Vec<Role>,
    /// Disabled users cannot log in
    pub active: bool,
    /// Created
    pub created_at: DateTime<Utc>,
    /// Last successful login
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Build a new active user
    pub fn create(tenant_id: TenantId, new_user: NewUser, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            email: new_user.email,
            name: new_user.name,
            phone: new_user.phone,
            password_hash,
            roles: new_user.roles,
            active: true,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    /// Whether the user holds `role`
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

impl TenantScoped for User {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Data for a user about to be created
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login email
    pub email: Email,
    /// Display name
    pub name: String,
    /// Phone number
    pub phone: Option<String>,
    /// Initial roles
    pub roles: Vec<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::Manager.to_string(), "manager");
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::create(
            Uuid::new_v4(),
            NewUser {
                email: Email::new("a@b.io").unwrap(),
                name: "A".into(),
                phone: None,
                roles: vec![Role::Customer],
            },
            "secret-hash".into(),
        );
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("\"customer\""));
    }
}
