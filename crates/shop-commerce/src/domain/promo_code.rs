//! Promo code aggregate
//!
//! A code is usable when it is enabled, inside its activity window and under
//! its usage limit. The order subtotal must then reach the minimum purchase.
//!
//! ```text
//!            active=false ──► Disabled
//!   now < starts_at ────────► Scheduled
//!   now >= ends_at ─────────► Expired
//!   usage_count >= limit ───► Exhausted
//!   otherwise ──────────────► Active
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shop_common::{Money, PromoCodeId, TenantId};
use shop_tenant::TenantScoped;
use thiserror::Error;
use uuid::Uuid;

use crate::error::CommerceError;

/// How the discount is computed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Discount {
    /// Percent of the subtotal, in (0, 100]
    Percentage { percent: Decimal },
    /// Flat amount off
    Fixed { amount: Money },
}

/// Lifecycle status at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromoStatus {
    Disabled,
    Scheduled,
    Expired,
    Exhausted,
    Active,
}

/// Why a code was not applied
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum PromoRejection {
    #[error("promo code is not active")]
    Inactive,
    #[error("promo code is not valid yet")]
    NotStarted,
    #[error("promo code has expired")]
    Expired,
    #[error("promo code usage limit reached")]
    UsageLimitReached,
    #[error("order subtotal must be at least {required}")]
    MinimumNotMet { required: Money },
    #[error("promo code currency does not match the order")]
    CurrencyMismatch,
}

/// A discount code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoCode {
    pub id: PromoCodeId,
    pub tenant_id: TenantId,
    /// Upper-case, unique per tenant
    pub code: String,
    pub description: String,
    pub discount: Discount,
    /// Cap for percentage discounts
    pub max_discount: Option<Money>,
    pub min_purchase: Option<Money>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub usage_limit: Option<u32>,
    pub usage_count: u32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for a new code
#[derive(Debug, Clone, Deserialize)]
pub struct NewPromoCode {
    pub code: String,
    #[serde(default)]
    pub description: String,
    pub discount: Discount,
    #[serde(default)]
    pub max_discount: Option<Money>,
    #[serde(default)]
    pub min_purchase: Option<Money>,
    /// Defaults to now
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage_limit: Option<u32>,
}

/// Partial update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromoCodeUpdate {
    pub description: Option<String>,
    pub discount: Option<Discount>,
    pub max_discount: Option<Money>,
    pub min_purchase: Option<Money>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub usage_limit: Option<u32>,
    pub active: Option<bool>,
}

impl PromoCode {
    /// Validate input and build an enabled code
    pub fn create(tenant_id: TenantId, input: NewPromoCode, now: DateTime<Utc>) -> Result<Self, CommerceError> {
        let code = normalize_code(&input.code)?;
        let promo = Self {
            id: Uuid::new_v4(),
            tenant_id,
            code,
            description: input.description.trim().to_string(),
            discount: input.discount,
            max_discount: input.max_discount,
            min_purchase: input.min_purchase,
            starts_at: input.starts_at.unwrap_or(now),
            ends_at: input.ends_at,
            usage_limit: input.usage_limit,
            usage_count: 0,
            active: true,
            created_at: now,
            updated_at: now,
        };
        promo.check_invariants()?;
        Ok(promo)
    }

    /// Apply a partial update, re-checking invariants
    pub fn apply(&mut self, update: PromoCodeUpdate) -> Result<(), CommerceError> {
        let mut next = self.clone();
        if let Some(description) = update.description {
            next.description = description.trim().to_string();
        }
        if let Some(discount) = update.discount {
            next.discount = discount;
        }
        if update.max_discount.is_some() {
            next.max_discount = update.max_discount;
        }
        if update.min_purchase.is_some() {
            next.min_purchase = update.min_purchase;
        }
        if let Some(starts_at) = update.starts_at {
            next.starts_at = starts_at;
        }
        if update.ends_at.is_some() {
            next.ends_at = update.ends_at;
        }
        if update.usage_limit.is_some() {
            next.usage_limit = update.usage_limit;
        }
        if let Some(active) = update.active {
            next.active = active;
        }
        next.check_invariants()?;
        next.updated_at = Utc::now();
        *self = next;
        Ok(())
    }

    /// Status at `now`
    pub fn status(&self, now: DateTime<Utc>) -> PromoStatus {
        if !self.active {
            PromoStatus::Disabled
        } else if now < self.starts_at {
            PromoStatus::Scheduled
        } else if self.ends_at.is_some_and(|end| now >= end) {
            PromoStatus::Expired
        } else if self.usage_limit.is_some_and(|limit| self.usage_count >= limit) {
            PromoStatus::Exhausted
        } else {
            PromoStatus::Active
        }
    }

    /// Whether the code can be applied to `subtotal` at `now`
    pub fn validate(&self, subtotal: &Money, now: DateTime<Utc>) -> Result<(), PromoRejection> {
        match self.status(now) {
            PromoStatus::Disabled => return Err(PromoRejection::Inactive),
            PromoStatus::Scheduled => return Err(PromoRejection::NotStarted),
            PromoStatus::Expired => return Err(PromoRejection::Expired),
            PromoStatus::Exhausted => return Err(PromoRejection::UsageLimitReached),
            PromoStatus::Active => {}
        }

        if let Some(min) = &self.min_purchase {
            if !min.same_currency(subtotal) {
                return Err(PromoRejection::CurrencyMismatch);
            }
            if subtotal.amount() < min.amount() {
                return Err(PromoRejection::MinimumNotMet { required: min.clone() });
            }
        }
        if let Discount::Fixed { amount } = &self.discount {
            if !amount.same_currency(subtotal) {
                return Err(PromoRejection::CurrencyMismatch);
            }
        }
        Ok(())
    }

    /// Discount for `subtotal`, never more than the subtotal itself.
    ///
    /// Does not check validity; call [`validate`](Self::validate) first.
    pub fn discount_for(&self, subtotal: &Money) -> Money {
        let raw = match &self.discount {
            Discount::Percentage { percent } => {
                let off = subtotal.percentage(*percent);
                match &self.max_discount {
                    Some(cap) if cap.same_currency(&off) && cap.amount() < off.amount() => cap.clone(),
                    _ => off,
                }
            }
            Discount::Fixed { amount } => amount.clone(),
        };

        let capped = if raw.amount() > subtotal.amount() {
            subtotal.amount()
        } else {
            raw.amount()
        };
        Money::new(capped, subtotal.currency().clone()).round()
    }

    /// Validate, count one use and return the discount
    pub fn redeem(&mut self, subtotal: &Money, now: DateTime<Utc>) -> Result<Money, PromoRejection> {
        self.validate(subtotal, now)?;
        self.usage_count += 1;
        self.updated_at = now;
        Ok(self.discount_for(subtotal))
    }

    fn check_invariants(&self) -> Result<(), CommerceError> {
        match &self.discount {
            Discount::Percentage { percent } => {
                if *percent <= Decimal::ZERO || *percent > Decimal::ONE_HUNDRED {
                    return Err(CommerceError::Validation("percentage must be in (0, 100]".into()));
                }
            }
            Discount::Fixed { amount } => {
                if !amount.is_positive() {
                    return Err(CommerceError::Validation("fixed discount must be positive".into()));
                }
            }
        }
        if self.max_discount.as_ref().is_some_and(|m| !m.is_positive()) {
            return Err(CommerceError::Validation("max_discount must be positive".into()));
        }
        if self.min_purchase.as_ref().is_some_and(|m| m.is_negative()) {
            return Err(CommerceError::Validation("min_purchase cannot be negative".into()));
        }
        if self.ends_at.is_some_and(|end| end <= self.starts_at) {
            return Err(CommerceError::Validation("ends_at must be after starts_at".into()));
        }
        if self.usage_limit == Some(0) {
            return Err(CommerceError::Validation("usage_limit must be at least 1".into()));
        }
        Ok(())
    }
}

impl TenantScoped for PromoCode {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Upper-case, `[A-Z0-9_-]`, 3 to 32 characters
pub fn normalize_code(raw: &str) -> Result<String, CommerceError> {
    let code = raw.trim().to_uppercase();
    let valid_chars = code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !(3..=32).contains(&code.len()) || !valid_chars {
        return Err(CommerceError::Validation(
            "code must be 3-32 characters of letters, digits, '-' or '_'".into(),
        ));
    }
    Ok(code)
}
