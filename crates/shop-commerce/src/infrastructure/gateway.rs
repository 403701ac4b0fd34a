//! In-process payment gateway

use async_trait::async_trait;
use shop_common::{Money, PaymentId};
use uuid::Uuid;

use crate::ports::{ChargeOutcome, PaymentGateway};

/// Approves every charge except method tokens starting with `fail`
#[derive(Debug, Default, Clone)]
pub struct SimulatedGateway;

impl SimulatedGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, payment_id: PaymentId, amount: &Money, method: &str) -> ChargeOutcome {
        let method = method.trim();
        if method.is_empty() {
            return ChargeOutcome::Declined("missing payment method".into());
        }
        if method.to_ascii_lowercase().starts_with("fail") {
            tracing::debug!(%payment_id, %amount, "simulated decline");
            return ChargeOutcome::Declined(format!("card declined ({method})"));
        }
        if !amount.is_positive() {
            return ChargeOutcome::Declined("amount must be positive".into());
        }
        ChargeOutcome::Approved(format!("sim_{}", Uuid::new_v4().simple()))
    }
}
