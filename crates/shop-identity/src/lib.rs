//! Storefront identity
//!
//! Tenant-scoped users with roles, argon2 password hashing and HS256 JWT
//! sessions (short-lived access token + single-use rotating refresh token).

#![warn(missing_docs)]

pub mod model;
pub mod password;
pub mod repository;
pub mod service;
pub mod tokens;

use shop_common::RepositoryError;
use thiserror::Error;

pub use model::{NewUser, Role, User};
pub use password::{HashingCost, PasswordManager, MIN_PASSWORD_LENGTH};
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::{AuthService, AuthenticatedUser, ProvisionUser, RegisterCommand, UserService};
pub use tokens::{Claims, TokenConfig, TokenKind, TokenPair, TokenService};

/// Identity errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// Unknown email, wrong password or disabled account
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Token malformed, wrong kind, bad signature or already used
    #[error("invalid token")]
    InvalidToken,

    /// Token past its expiry
    #[error("token expired")]
    TokenExpired,

    /// Token issued for another tenant
    #[error("token was issued for a different tenant")]
    TenantMismatch,

    /// User does not exist in this tenant
    #[error("user not found")]
    UserNotFound,

    /// User has been deactivated
    #[error("user is inactive")]
    UserInactive,

    /// Email already registered in this tenant
    #[error("email already registered: {0}")]
    EmailTaken(String),

    /// Input rejected
    #[error("validation error: {0}")]
    Validation(String),

    /// Password hashing or token signing failed
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Storage failure
    #[error("repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for IdentityError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::UserNotFound,
            RepositoryError::Duplicate(key) => Self::EmailTaken(key),
            other => Self::Repository(other),
        }
    }
}
