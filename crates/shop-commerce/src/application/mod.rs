//! Application services
//!
//! Orchestrate domain objects, repositories and the event publisher.

pub mod carts;
pub mod orders;
pub mod payments;
pub mod products;
pub mod promo_codes;

#[cfg(test)]
pub(crate) mod fixtures;

use shop_common::{RepositoryError, UserId};
use std::sync::Arc;

use crate::domain::CommerceEvent;
use crate::ports::EventPublisher;

pub use carts::CartService;
pub use orders::{CheckoutCommand, OrderService};
pub use payments::PaymentService;
pub use products::ProductService;
pub use promo_codes::{PromoCodeService, PromoQuote};

/// Who is looking at an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    /// Admin or manager; sees every order of the tenant
    Staff,
    /// Sees only their own orders
    Customer(UserId),
}

impl Viewer {
    pub(crate) fn can_see(&self, owner: UserId) -> bool {
        match self {
            Self::Staff => true,
            Self::Customer(id) => *id == owner,
        }
    }
}

/// Publish after the state change is stored; a failed publish is logged, not returned
pub(crate) async fn publish(publisher: &Arc<dyn EventPublisher>, events: Vec<CommerceEvent>) {
    if events.is_empty() {
        return;
    }
    let count = events.len();
    if let Err(e) = publisher.publish(events).await {
        tracing::warn!(error = %e, count, "failed to publish commerce events");
    }
}

pub(crate) fn stock_conflict(err: RepositoryError) -> crate::CommerceError {
    match err {
        RepositoryError::Conflict(msg) => crate::CommerceError::Conflict(msg),
        RepositoryError::NotFound => crate::CommerceError::NotFound("product"),
        other => other.into(),
    }
}
