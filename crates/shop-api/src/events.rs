//! Commerce events to customer notifications

use async_trait::async_trait;
use shop_commerce::{CommerceEvent, EventPublisher};
use shop_common::{Email, RepositoryError, TenantId};
use shop_identity::{User, UserRepository};
use shop_notify::{NotificationDispatcher, NotificationEvent, NotificationKind, Recipient};
use shop_tenant::{TenantContext, TenantRepository};
use std::sync::Arc;

/// Publishes commerce events by queueing notifications for the customer
pub struct NotificationPublisher {
    dispatcher: NotificationDispatcher,
    tenants: Arc<dyn TenantRepository>,
    users: Arc<dyn UserRepository>,
}

impl NotificationPublisher {
    pub fn new(
        dispatcher: NotificationDispatcher,
        tenants: Arc<dyn TenantRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self { dispatcher, tenants, users }
    }

    /// Welcome message after sign-up
    pub async fn user_registered(&self, ctx: &TenantContext, user: &User) {
        let event = NotificationEvent::new(
            ctx.tenant_id(),
            NotificationKind::UserRegistered,
            Recipient { email: Some(user.email.to_string()), phone: user.phone.clone() },
        )
        .with_var("shop", self.shop_name(ctx.tenant_id()).await)
        .with_var("name", &user.name)
        .with_var("email", &user.email);
        self.enqueue(event);
    }

    async fn to_notification(&self, event: CommerceEvent) -> NotificationEvent {
        let tenant_id = event.tenant_id();
        let order_id = event.order_id();

        let (kind, email, vars): (NotificationKind, String, Vec<(&str, String)>) = match event {
            CommerceEvent::OrderCreated { customer_email, total, item_count, promo_code, .. } => (
                NotificationKind::OrderCreated,
                customer_email,
                vec![
                    ("total", total.to_string()),
                    ("item_count", item_count.to_string()),
                    ("promo_code", promo_code.unwrap_or_default()),
                ],
            ),
            CommerceEvent::OrderStatusChanged { customer_email, from, to, .. } => (
                NotificationKind::OrderStatusChanged,
                customer_email,
                vec![("previous_status", from.to_string()), ("status", to.to_string())],
            ),
            CommerceEvent::PaymentCompleted { customer_email, amount, provider_ref, .. } => (
                NotificationKind::PaymentCompleted,
                customer_email,
                vec![("amount", amount.to_string()), ("provider_ref", provider_ref)],
            ),
            CommerceEvent::PaymentFailed { customer_email, amount, reason, .. } => (
                NotificationKind::PaymentFailed,
                customer_email,
                vec![("amount", amount.to_string()), ("reason", reason)],
            ),
        };

        let customer = self.customer(tenant_id, &email).await;
        let recipient = Recipient {
            email: Some(email.clone()),
            phone: customer.as_ref().and_then(|u| u.phone.clone()),
        };

        let mut notification = NotificationEvent::new(tenant_id, kind, recipient)
            .with_var("shop", self.shop_name(tenant_id).await)
            .with_var("order_id", order_id)
            .with_var("email", &email)
            .with_var("name", customer.map(|u| u.name).unwrap_or_default());
        for (key, value) in vars {
            notification = notification.with_var(key, value);
        }
        notification
    }

    async fn customer(&self, tenant_id: TenantId, email: &str) -> Option<User> {
        let email = Email::new(email).ok()?;
        match self.users.find_by_email(&TenantContext::new(tenant_id), &email).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(%tenant_id, error = %e, "customer lookup failed");
                None
            }
        }
    }

    async fn shop_name(&self, tenant_id: TenantId) -> String {
        match self.tenants.find_by_id(tenant_id).await {
            Ok(Some(tenant)) => tenant.name,
            _ => "our shop".into(),
        }
    }

    fn enqueue(&self, event: NotificationEvent) {
        let kind = event.kind;
        let tenant_id = event.tenant_id;
        if let Err(e) = self.dispatcher.enqueue(event) {
            tracing::warn!(%tenant_id, %kind, error = %e, "notification not queued");
        }
    }
}

#[async_trait]
impl EventPublisher for NotificationPublisher {
    async fn publish(&self, events: Vec<CommerceEvent>) -> Result<(), RepositoryError> {
        for event in events {
            tracing::debug!(event = event.name(), order_id = %event.order_id(), "publishing commerce event");
            let notification = self.to_notification(event).await;
            self.enqueue(notification);
        }
        Ok(())
    }
}
