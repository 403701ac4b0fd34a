//! Payment record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shop_common::{Money, OrderId, PaymentId, TenantId, UserId};
use shop_tenant::TenantScoped;
use uuid::Uuid;

/// Payment outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// One charge attempt against an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub amount: Money,
    /// Method token handed to the gateway
    pub method: String,
    pub status: PaymentStatus,
    pub provider_ref: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// New pending payment
    pub fn start(tenant_id: TenantId, order_id: OrderId, user_id: UserId, amount: Money, method: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            order_id,
            user_id,
            amount,
            method,
            status: PaymentStatus::Pending,
            provider_ref: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark captured
    pub fn complete(&mut self, provider_ref: String) {
        self.status = PaymentStatus::Completed;
        self.provider_ref = Some(provider_ref);
        self.updated_at = Utc::now();
    }

    /// Mark declined
    pub fn fail(&mut self, reason: String) {
        self.status = PaymentStatus::Failed;
        self.failure_reason = Some(reason);
        self.updated_at = Utc::now();
    }
}

impl TenantScoped for Payment {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
