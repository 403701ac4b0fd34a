//! Commerce domain events
//!
//! Raised by aggregates and services, published after the state change is
//! persisted. Each event carries enough data to notify the customer without
//! another lookup.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shop_common::{Money, OrderId, PaymentId, TenantId, UserId};

use crate::domain::order::OrderStatus;

/// Events in the commerce bounded context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CommerceEvent {
    OrderCreated {
        tenant_id: TenantId,
        order_id: OrderId,
        user_id: UserId,
        customer_email: String,
        total: Money,
        item_count: u32,
        promo_code: Option<String>,
        occurred_at: DateTime<Utc>,
    },

    OrderStatusChanged {
        tenant_id: TenantId,
        order_id: OrderId,
        user_id: UserId,
        customer_email: String,
        from: OrderStatus,
        to: OrderStatus,
        occurred_at: DateTime<Utc>,
    },

    PaymentCompleted {
        tenant_id: TenantId,
        order_id: OrderId,
        payment_id: PaymentId,
        customer_email: String,
        amount: Money,
        provider_ref: String,
        occurred_at: DateTime<Utc>,
    },

    PaymentFailed {
        tenant_id: TenantId,
        order_id: OrderId,
        payment_id: PaymentId,
        customer_email: String,
        amount: Money,
        reason: String,
        occurred_at: DateTime<Utc>,
    },
}

impl CommerceEvent {
    /// Tenant the event belongs to
    pub fn tenant_id(&self) -> TenantId {
        match self {
            Self::OrderCreated { tenant_id, .. }
            | Self::OrderStatusChanged { tenant_id, .. }
            | Self::PaymentCompleted { tenant_id, .. }
            | Self::PaymentFailed { tenant_id, .. } => *tenant_id,
        }
    }

    /// Order the event is about
    pub fn order_id(&self) -> OrderId {
        match self {
            Self::OrderCreated { order_id, .. }
            | Self::OrderStatusChanged { order_id, .. }
            | Self::PaymentCompleted { order_id, .. }
            | Self::PaymentFailed { order_id, .. } => *order_id,
        }
    }

    /// Stable event name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::OrderCreated { .. } => "order_created",
            Self::OrderStatusChanged { .. } => "order_status_changed",
            Self::PaymentCompleted { .. } => "payment_completed",
            Self::PaymentFailed { .. } => "payment_failed",
        }
    }
}
