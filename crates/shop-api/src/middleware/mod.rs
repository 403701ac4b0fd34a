//! Request middleware, outermost first: tenant, brute force, auth, roles

pub mod auth;
pub mod bruteforce;
pub mod roles;
pub mod tenant;

pub use auth::{auth_middleware, AuthUser};
pub use bruteforce::{bruteforce_middleware, BruteforceConfig, BruteforceGuard, ClientIp, GuardLayer, GuardedRoute};
pub use roles::{enforce_roles, RoleGuard};
pub use tenant::{tenant_middleware, Tenant};
