//! Promo code management and redemption

use chrono::Utc;
use serde::Serialize;
use shop_common::{Money, Page, PageRequest, PromoCodeId, RepositoryError};
use shop_tenant::TenantContext;
use std::sync::Arc;

use crate::domain::promo_code::normalize_code;
use crate::domain::{NewPromoCode, PromoCode, PromoCodeUpdate, PromoRejection};
use crate::error::CommerceError;
use crate::ports::PromoCodeRepository;

/// Price breakdown for a code applied to a subtotal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromoQuote {
    pub code: String,
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
}

/// Promo code application service
#[derive(Clone)]
pub struct PromoCodeService {
    codes: Arc<dyn PromoCodeRepository>,
}

impl PromoCodeService {
    pub fn new(codes: Arc<dyn PromoCodeRepository>) -> Self {
        Self { codes }
    }

    pub async fn create(&self, ctx: &TenantContext, input: NewPromoCode) -> Result<PromoCode, CommerceError> {
        let promo = PromoCode::create(ctx.tenant_id(), input, Utc::now())?;
        self.codes.insert(ctx, &promo).await?;
        tracing::info!(tenant_id = %ctx.tenant_id(), code = %promo.code, "promo code created");
        Ok(promo)
    }

    pub async fn update(
        &self,
        ctx: &TenantContext,
        id: PromoCodeId,
        update: PromoCodeUpdate,
    ) -> Result<PromoCode, CommerceError> {
        let mut promo = self.get(ctx, id).await?;
        promo.apply(update)?;
        self.codes.update(ctx, &promo).await?;
        Ok(promo)
    }

    pub async fn get(&self, ctx: &TenantContext, id: PromoCodeId) -> Result<PromoCode, CommerceError> {
        self.codes
            .find_by_id(ctx, id)
            .await?
            .ok_or(CommerceError::NotFound("promo code"))
    }

    /// Case-insensitive lookup
    pub async fn get_by_code(&self, ctx: &TenantContext, code: &str) -> Result<PromoCode, CommerceError> {
        let code = normalize_code(code).map_err(|_| CommerceError::NotFound("promo code"))?;
        self.codes
            .find_by_code(ctx, &code)
            .await?
            .ok_or(CommerceError::NotFound("promo code"))
    }

    pub async fn list(&self, ctx: &TenantContext, page: PageRequest) -> Result<Page<PromoCode>, CommerceError> {
        Ok(Page::from_vec(self.codes.list(ctx).await?, page))
    }

    /// Disable without deleting; past orders keep referring to it
    pub async fn deactivate(&self, ctx: &TenantContext, id: PromoCodeId) -> Result<PromoCode, CommerceError> {
        self.update(ctx, id, PromoCodeUpdate { active: Some(false), ..Default::default() })
            .await
    }

    /// Check a code against `subtotal` without consuming it
    pub async fn validate(&self, ctx: &TenantContext, code: &str, subtotal: &Money) -> Result<PromoQuote, CommerceError> {
        let promo = self.get_by_code(ctx, code).await?;
        if let Err(rejection) = promo.validate(subtotal, Utc::now()) {
            tracing::debug!(tenant_id = %ctx.tenant_id(), code = %promo.code, %rejection, "promo code rejected");
            return Err(rejection.into());
        }
        quote(&promo, subtotal, promo.discount_for(subtotal))
    }

    /// Validate and count one use.
    ///
    /// The count is re-checked against the stored code, so a code disabled,
    /// expired or used up after the first check is still rejected.
    pub async fn redeem(&self, ctx: &TenantContext, code: &str, subtotal: &Money) -> Result<PromoQuote, CommerceError> {
        let now = Utc::now();
        let mut promo = self.get_by_code(ctx, code).await?;
        let discount = promo.redeem(subtotal, now)?;

        match self.codes.increment_usage(ctx, promo.id, now).await {
            Ok(_) => {}
            Err(RepositoryError::Conflict(_)) => {
                let rejection = self
                    .codes
                    .find_by_id(ctx, promo.id)
                    .await?
                    .and_then(|stored| stored.validate(subtotal, now).err())
                    .unwrap_or(PromoRejection::UsageLimitReached);
                return Err(rejection.into());
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(tenant_id = %ctx.tenant_id(), code = %promo.code, %discount, "promo code redeemed");
        quote(&promo, subtotal, discount)
    }

    /// Give back a use taken by [`redeem`](Self::redeem) for an order that was never stored
    pub async fn release(&self, ctx: &TenantContext, code: &str) -> Result<(), CommerceError> {
        let promo = self.get_by_code(ctx, code).await?;
        let remaining = self.codes.decrement_usage(ctx, promo.id).await?;
        tracing::info!(tenant_id = %ctx.tenant_id(), code = %promo.code, usage_count = remaining, "promo code use returned");
        Ok(())
    }
}

fn quote(promo: &PromoCode, subtotal: &Money, discount: Money) -> Result<PromoQuote, CommerceError> {
    let total = subtotal.subtract(&discount)?;
    Ok(PromoQuote {
        code: promo.code.clone(),
        subtotal: subtotal.clone(),
        discount,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fixtures::Fixture;
    use crate::domain::Discount;
    use rust_decimal_macros::dec;
    use shop_common::Currency;

    fn usd(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }

    #[tokio::test]
    async fn test_validate_does_not_consume() {
        let fx = Fixture::new();
        let promo = fx.percent_promo("SAVE10", dec!(10), Some(1)).await;

        let quote = fx.promos.validate(&fx.ctx, "save10", &usd(dec!(80))).await.unwrap();
        assert_eq!(quote.discount.amount(), dec!(8.00));
        assert_eq!(quote.total.amount(), dec!(72.00));
        assert_eq!(fx.promos.get(&fx.ctx, promo.id).await.unwrap().usage_count, 0);
    }

    #[tokio::test]
    async fn test_redeem_until_exhausted() {
        let fx = Fixture::new();
        let promo = fx.percent_promo("ONCE", dec!(10), Some(1)).await;

        fx.promos.redeem(&fx.ctx, "ONCE", &usd(dec!(100))).await.unwrap();
        assert_eq!(
            fx.promos.redeem(&fx.ctx, "ONCE", &usd(dec!(100))).await.unwrap_err(),
            CommerceError::PromoRejected(PromoRejection::UsageLimitReached)
        );
        assert_eq!(fx.promos.get(&fx.ctx, promo.id).await.unwrap().usage_count, 1);
    }

    #[tokio::test]
    async fn test_unknown_and_disabled_codes() {
        let fx = Fixture::new();
        assert_eq!(
            fx.promos.validate(&fx.ctx, "NOPE", &usd(dec!(10))).await.unwrap_err(),
            CommerceError::NotFound("promo code")
        );

        let promo = fx.percent_promo("OFF", dec!(10), None).await;
        fx.promos.deactivate(&fx.ctx, promo.id).await.unwrap();
        assert_eq!(
            fx.promos.validate(&fx.ctx, "OFF", &usd(dec!(10))).await.unwrap_err(),
            CommerceError::PromoRejected(PromoRejection::Inactive)
        );
    }

    #[tokio::test]
    async fn test_fixed_code_and_duplicate() {
        let fx = Fixture::new();
        let input = NewPromoCode {
            code: "FIVE".into(),
            description: "five off".into(),
            discount: Discount::Fixed { amount: usd(dec!(5)) },
            max_discount: None,
            min_purchase: Some(usd(dec!(20))),
            starts_at: None,
            ends_at: None,
            usage_limit: None,
        };
        fx.promos.create(&fx.ctx, input.clone()).await.unwrap();
        assert!(matches!(fx.promos.create(&fx.ctx, input).await, Err(CommerceError::Conflict(_))));

        assert!(matches!(
            fx.promos.validate(&fx.ctx, "FIVE", &usd(dec!(10))).await,
            Err(CommerceError::PromoRejected(PromoRejection::MinimumNotMet { .. }))
        ));
        let quote = fx.promos.validate(&fx.ctx, "five", &usd(dec!(20))).await.unwrap();
        assert_eq!(quote.total.amount(), dec!(15));
    }

    #[tokio::test]
    async fn test_release_returns_one_use() {
        let fx = Fixture::new();
        let promo = fx.percent_promo("ONCE", dec!(10), Some(1)).await;

        fx.promos.redeem(&fx.ctx, "ONCE", &usd(dec!(50))).await.unwrap();
        fx.promos.release(&fx.ctx, "once").await.unwrap();
        assert_eq!(fx.promos.get(&fx.ctx, promo.id).await.unwrap().usage_count, 0);
        fx.promos.redeem(&fx.ctx, "ONCE", &usd(dec!(50))).await.unwrap();
    }
}
