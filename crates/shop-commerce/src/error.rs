//! Commerce errors

use shop_common::{MoneyError, ProductId, RepositoryError};
use thiserror::Error;

use crate::domain::{OrderStatus, PromoRejection};

/// Errors returned by commerce services
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommerceError {
    /// Entity missing in this tenant
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Unique key already used (sku, promo code)
    #[error("already exists: {0}")]
    Conflict(String),

    /// Input rejected
    #[error("validation error: {0}")]
    Validation(String),

    /// Not enough units in stock
    #[error("insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        /// Product
        product_id: ProductId,
        /// Units asked for
        requested: u32,
        /// Units on hand
        available: u32,
    },

    /// Product is deactivated
    #[error("product {0} is not available")]
    ProductUnavailable(ProductId),

    /// Checkout with nothing in the cart
    #[error("cart is empty")]
    EmptyCart,

    /// Promo code cannot be applied
    #[error("promo code rejected: {0}")]
    PromoRejected(PromoRejection),

    /// Order status change not allowed
    #[error("cannot move order from {from:?} to {to:?}")]
    InvalidTransition {
        /// Current status
        from: OrderStatus,
        /// Requested status
        to: OrderStatus,
    },

    /// Gateway refused the charge
    #[error("payment declined: {0}")]
    PaymentDeclined(String),

    /// Storage failure
    #[error("repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CommerceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Duplicate(key) => Self::Conflict(key),
            other => Self::Repository(other),
        }
    }
}

impl From<MoneyError> for CommerceError {
    fn from(err: MoneyError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<PromoRejection> for CommerceError {
    fn from(rejection: PromoRejection) -> Self {
        Self::PromoRejected(rejection)
    }
}
