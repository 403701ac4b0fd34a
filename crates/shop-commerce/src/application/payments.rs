//! Paying for orders

use chrono::Utc;
use shop_common::{OrderId, PaymentId, RepositoryError};
use shop_tenant::TenantContext;
use std::sync::Arc;

use crate::application::{publish, Viewer};
use crate::domain::{CommerceEvent, Order, OrderStatus, Payment};
use crate::error::CommerceError;
use crate::ports::{ChargeOutcome, EventPublisher, OrderRepository, PaymentGateway, PaymentRepository};

/// Payment application service
#[derive(Clone)]
pub struct PaymentService {
    payments: Arc<dyn PaymentRepository>,
    orders: Arc<dyn OrderRepository>,
    gateway: Arc<dyn PaymentGateway>,
    publisher: Arc<dyn EventPublisher>,
}

impl PaymentService {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        orders: Arc<dyn OrderRepository>,
        gateway: Arc<dyn PaymentGateway>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self { payments, orders, gateway, publisher }
    }

    /// Charge the order total.
    ///
    /// The order is held for the duration of the charge, so a concurrent
    /// cancel or second payment gets `Conflict` instead of racing it.
    /// On approval the order becomes `Paid`. On decline the attempt is kept as
    /// `Failed`, the order stays `Pending` and `PaymentDeclined` is returned.
    pub async fn pay(
        &self,
        ctx: &TenantContext,
        order_id: OrderId,
        viewer: Viewer,
        method: &str,
    ) -> Result<Payment, CommerceError> {
        let visible = self.order(ctx, order_id, viewer).await?;
        if visible.status() != OrderStatus::Pending {
            return Err(CommerceError::InvalidTransition { from: visible.status(), to: OrderStatus::Paid });
        }

        let mut order = self.orders.hold_for_payment(ctx, visible.id).await.map_err(|e| match e {
            RepositoryError::Conflict(msg) => CommerceError::Conflict(msg),
            other => other.into(),
        })?;
        let pending = order.clone();

        let outcome = self.charge(ctx, &mut order, method).await;
        // A failed charge leaves the order as it was
        let settled = if outcome.is_ok() { &order } else { &pending };
        self.orders.release_payment_hold(ctx, settled).await?;

        match outcome {
            Ok(payment) => {
                tracing::info!(
                    tenant_id = %ctx.tenant_id(),
                    order_id = %order.id,
                    payment_id = %payment.id,
                    amount = %payment.amount,
                    "payment completed"
                );
                let mut events = order.take_events();
                events.push(CommerceEvent::PaymentCompleted {
                    tenant_id: ctx.tenant_id(),
                    order_id: order.id,
                    payment_id: payment.id,
                    customer_email: order.customer_email.clone(),
                    amount: payment.amount.clone(),
                    provider_ref: payment.provider_ref.clone().unwrap_or_default(),
                    occurred_at: Utc::now(),
                });
                publish(&self.publisher, events).await;
                Ok(payment)
            }
            Err(ChargeError::Declined { payment, reason }) => {
                tracing::warn!(
                    tenant_id = %ctx.tenant_id(),
                    order_id = %order.id,
                    payment_id = %payment.id,
                    %reason,
                    "payment declined"
                );
                publish(
                    &self.publisher,
                    vec![CommerceEvent::PaymentFailed {
                        tenant_id: ctx.tenant_id(),
                        order_id: order.id,
                        payment_id: payment.id,
                        customer_email: order.customer_email.clone(),
                        amount: payment.amount.clone(),
                        reason: reason.clone(),
                        occurred_at: Utc::now(),
                    }],
                )
                .await;
                Err(CommerceError::PaymentDeclined(reason))
            }
            Err(ChargeError::Failed(e)) => Err(e),
        }
    }

    /// Record the attempt and call the gateway for a held order
    async fn charge(&self, ctx: &TenantContext, order: &mut Order, method: &str) -> Result<Payment, ChargeError> {
        let mut payment = Payment::start(
            ctx.tenant_id(),
            order.id,
            order.user_id,
            order.total.clone(),
            method.trim().to_string(),
        );
        self.payments.save(ctx, &payment).await.map_err(|e| ChargeError::Failed(e.into()))?;

        match self.gateway.charge(payment.id, &payment.amount, &payment.method).await {
            ChargeOutcome::Approved(provider_ref) => {
                payment.complete(provider_ref);
                self.payments.save(ctx, &payment).await.map_err(|e| ChargeError::Failed(e.into()))?;
                order.transition_to(OrderStatus::Paid).map_err(ChargeError::Failed)?;
                Ok(payment)
            }
            ChargeOutcome::Declined(reason) => {
                payment.fail(reason.clone());
                self.payments.save(ctx, &payment).await.map_err(|e| ChargeError::Failed(e.into()))?;
                Err(ChargeError::Declined { payment, reason })
            }
        }
    }

    pub async fn get(&self, ctx: &TenantContext, id: PaymentId, viewer: Viewer) -> Result<Payment, CommerceError> {
        self.payments
            .find_by_id(ctx, id)
            .await?
            .filter(|p| viewer.can_see(p.user_id))
            .ok_or(CommerceError::NotFound("payment"))
    }

    /// Attempts for an order the viewer can see
    pub async fn list_for_order(
        &self,
        ctx: &TenantContext,
        order_id: OrderId,
        viewer: Viewer,
    ) -> Result<Vec<Payment>, CommerceError> {
        let order = self.order(ctx, order_id, viewer).await?;
        Ok(self.payments.list_for_order(ctx, order.id).await?)
    }

    async fn order(&self, ctx: &TenantContext, id: OrderId, viewer: Viewer) -> Result<Order, CommerceError> {
        self.orders
            .find_by_id(ctx, id)
            .await?
            .filter(|o| viewer.can_see(o.user_id))
            .ok_or(CommerceError::NotFound("order"))
    }
}

/// Why a charge did not complete
enum ChargeError {
    Declined { payment: Payment, reason: String },
    Failed(CommerceError),
}
