//! Order aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shop_common::{Money, OrderId, ProductId, TenantId, UserId};
use shop_tenant::TenantScoped;
use std::fmt;
use uuid::Uuid;

use crate::domain::events::CommerceEvent;
use crate::error::CommerceError;

/// Order lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Allowed moves:
    /// `Pending → Paid → Shipped → Delivered`, `Pending → Cancelled`, `Paid → Refunded`
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Paid) | (Paid, Shipped) | (Shipped, Delivered) | (Pending, Cancelled) | (Paid, Refunded)
        )
    }

    /// No further transitions possible
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled | Self::Refunded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priced order line, frozen at checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
}

impl OrderLine {
    /// Line with computed total
    pub fn new(product_id: ProductId, sku: String, name: String, unit_price: Money, quantity: u32) -> Self {
        let line_total = unit_price.multiply(Decimal::from(quantity)).round();
        Self { product_id, sku, name, unit_price, quantity, line_total }
    }
}

/// A placed order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub customer_email: String,
    pub items: Vec<OrderLine>,
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
    pub promo_code: Option<String>,
    status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<CommerceEvent>,
}

impl Order {
    /// Price the lines, apply `discount` and raise `OrderCreated`
    pub fn place(
        tenant_id: TenantId,
        user_id: UserId,
        customer_email: String,
        items: Vec<OrderLine>,
        discount: Option<(String, Money)>,
    ) -> Result<Self, CommerceError> {
        let first = items.first().ok_or(CommerceError::EmptyCart)?;
        let currency = first.unit_price.currency().clone();

        let mut subtotal = Money::zero(currency.clone());
        for line in &items {
            subtotal = subtotal.add(&line.line_total)?;
        }

        let (promo_code, discount) = match discount {
            Some((code, amount)) => (Some(code), amount),
            None => (None, Money::zero(currency)),
        };
        let total = subtotal.subtract(&discount)?;
        if total.is_negative() {
            return Err(CommerceError::Validation("discount exceeds subtotal".into()));
        }

        let now = Utc::now();
        let item_count = items.iter().map(|l| l.quantity).sum();
        let mut order = Self {
            id: Uuid::new_v4(),
            tenant_id,
            user_id,
            customer_email,
            items,
            subtotal,
            discount,
            total,
            promo_code,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            events: vec![],
        };

        order.raise_event(CommerceEvent::OrderCreated {
            tenant_id,
            order_id: order.id,
            user_id,
            customer_email: order.customer_email.clone(),
            total: order.total.clone(),
            item_count,
            promo_code: order.promo_code.clone(),
            occurred_at: now,
        });
        Ok(order)
    }

    /// Current status
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Move to `next` if the state machine allows it
    pub fn transition_to(&mut self, next: OrderStatus) -> Result<(), CommerceError> {
        let from = self.status;
        if !from.can_transition_to(next) {
            return Err(CommerceError::InvalidTransition { from, to: next });
        }

        let now = Utc::now();
        self.status = next;
        self.updated_at = now;
        self.raise_event(CommerceEvent::OrderStatusChanged {
            tenant_id: self.tenant_id,
            order_id: self.id,
            user_id: self.user_id,
            customer_email: self.customer_email.clone(),
            from,
            to: next,
            occurred_at: now,
        });
        Ok(())
    }

    /// Drain pending events
    pub fn take_events(&mut self) -> Vec<CommerceEvent> {
        std::mem::take(&mut self.events)
    }

    fn raise_event(&mut self, event: CommerceEvent) {
        self.events.push(event);
    }
}

impl TenantScoped for Order {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
