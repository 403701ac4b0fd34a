//! Outbound ports
//!
//! Interfaces the infrastructure implements. Every repository method takes the
//! tenant context and must only see rows of that tenant.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use shop_common::{Money, OrderId, PaymentId, ProductId, PromoCodeId, RepositoryError, UserId};
use shop_tenant::TenantContext;

use crate::domain::{Cart, CommerceEvent, Order, OrderStatus, Payment, Product, PromoCode};

/// Signed stock change for one product
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub product_id: ProductId,
    pub delta: i64,
}

/// Product catalog storage
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, ctx: &TenantContext, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn find_by_sku(&self, ctx: &TenantContext, sku: &str) -> Result<Option<Product>, RepositoryError>;

    /// All products, newest first
    async fn list(&self, ctx: &TenantContext) -> Result<Vec<Product>, RepositoryError>;

    /// Insert; sku unique per tenant
    async fn insert(&self, ctx: &TenantContext, product: &Product) -> Result<(), RepositoryError>;

    /// Store catalog fields; the stored stock is kept
    async fn update(&self, ctx: &TenantContext, product: &Product) -> Result<(), RepositoryError>;

    /// Apply all changes or none. `Conflict` if any stock would go negative.
    async fn apply_stock_changes(&self, ctx: &TenantContext, changes: &[StockChange]) -> Result<(), RepositoryError>;
}

/// Cart storage, one cart per user
#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn find(&self, ctx: &TenantContext, user_id: UserId) -> Result<Option<Cart>, RepositoryError>;

    /// Insert or replace
    async fn save(&self, ctx: &TenantContext, cart: &Cart) -> Result<(), RepositoryError>;

    async fn delete(&self, ctx: &TenantContext, user_id: UserId) -> Result<(), RepositoryError>;
}

/// Order storage
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, ctx: &TenantContext, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Orders of one user, newest first
    async fn list_for_user(&self, ctx: &TenantContext, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// All orders of the tenant, newest first
    async fn list(&self, ctx: &TenantContext) -> Result<Vec<Order>, RepositoryError>;

    async fn insert(&self, ctx: &TenantContext, order: &Order) -> Result<(), RepositoryError>;

    /// Replace the order if its stored status is still `expected` and no payment
    /// holds it. `Conflict` otherwise.
    async fn update_if(&self, ctx: &TenantContext, order: &Order, expected: OrderStatus) -> Result<(), RepositoryError>;

    /// Reserve a pending order for one charge. `Conflict` if it is not pending
    /// or another charge holds it.
    async fn hold_for_payment(&self, ctx: &TenantContext, id: OrderId) -> Result<Order, RepositoryError>;

    /// Store the outcome of the charge and drop the hold
    async fn release_payment_hold(&self, ctx: &TenantContext, order: &Order) -> Result<(), RepositoryError>;
}

/// Payment storage
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn find_by_id(&self, ctx: &TenantContext, id: PaymentId) -> Result<Option<Payment>, RepositoryError>;

    /// Attempts for one order, oldest first
    async fn list_for_order(&self, ctx: &TenantContext, order_id: OrderId) -> Result<Vec<Payment>, RepositoryError>;

    /// Insert or replace
    async fn save(&self, ctx: &TenantContext, payment: &Payment) -> Result<(), RepositoryError>;
}

/// Promo code storage
#[async_trait]
pub trait PromoCodeRepository: Send + Sync {
    async fn find_by_id(&self, ctx: &TenantContext, id: PromoCodeId) -> Result<Option<PromoCode>, RepositoryError>;

    /// Lookup by normalised code
    async fn find_by_code(&self, ctx: &TenantContext, code: &str) -> Result<Option<PromoCode>, RepositoryError>;

    async fn list(&self, ctx: &TenantContext) -> Result<Vec<PromoCode>, RepositoryError>;

    /// Insert; code unique per tenant
    async fn insert(&self, ctx: &TenantContext, promo: &PromoCode) -> Result<(), RepositoryError>;

    async fn update(&self, ctx: &TenantContext, promo: &PromoCode) -> Result<(), RepositoryError>;

    /// Count one use if the code is still active at `now`. `Conflict` when it is not.
    async fn increment_usage(
        &self,
        ctx: &TenantContext,
        id: PromoCodeId,
        now: DateTime<Utc>,
    ) -> Result<u32, RepositoryError>;

    /// Give back one use
    async fn decrement_usage(&self, ctx: &TenantContext, id: PromoCodeId) -> Result<u32, RepositoryError>;
}

/// Event publisher port
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish domain events
    async fn publish(&self, events: Vec<CommerceEvent>) -> Result<(), RepositoryError>;
}

/// Result of a charge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ChargeOutcome {
    /// Captured; provider reference
    Approved(String),
    /// Refused; reason
    Declined(String),
}

/// Payment provider port
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charge `amount` using the opaque `method` token
    async fn charge(&self, payment_id: PaymentId, amount: &Money, method: &str) -> ChargeOutcome;
}
