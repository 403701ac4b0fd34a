//! Storefront shared kernel
//!
//! Value objects and error types used by every storefront crate.
//!
//! - **Money**: decimal amount + currency, checked arithmetic
//! - **Email**: normalised, validated address
//! - **Paging**: request/response pagination primitives
//! - **Identifiers**: UUID aliases for the main aggregates

#![warn(missing_docs)]

pub mod email;
pub mod error;
pub mod money;
pub mod paging;

pub use email::{Email, EmailError};
pub use error::RepositoryError;
pub use money::{Currency, Money, MoneyError};
pub use paging::{Page, PageRequest};

/// Tenant identifier
pub type TenantId = uuid::Uuid;
/// User identifier
pub type UserId = uuid::Uuid;
/// Product identifier
pub type ProductId = uuid::Uuid;
/// Order identifier
pub type OrderId = uuid::Uuid;
/// Payment identifier
pub type PaymentId = uuid::Uuid;
/// Promo code identifier
pub type PromoCodeId = uuid::Uuid;
