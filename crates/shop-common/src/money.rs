//! Money value object
//!
//! Decimal amount tagged with a currency. Arithmetic between different
//! currencies is rejected rather than silently converted.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Monetary value with currency
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Create a new money value
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Create money from minor units (cents)
    pub fn from_cents(cents: i64, currency: Currency) -> Self {
        Self::new(Decimal::new(cents, 2), currency)
    }

    /// Zero in the given currency
    pub fn zero(currency: Currency) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// Amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Currency
    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    /// Check if same currency
    pub fn same_currency(&self, other: &Money) -> bool {
        self.currency == other.currency
    }

    /// Add money (must be same currency)
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Money::new(self.amount + other.amount, self.currency.clone()))
    }

    /// Subtract money (must be same currency)
    pub fn subtract(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Money::new(self.amount - other.amount, self.currency.clone()))
    }

    /// Multiply by a factor
    pub fn multiply(&self, factor: Decimal) -> Money {
        Money::new(self.amount * factor, self.currency.clone())
    }

    /// `pct` percent of this amount, e.g. `percentage(15)` of 200.00 is 30.00
    pub fn percentage(&self, pct: Decimal) -> Money {
        self.multiply(pct / Decimal::ONE_HUNDRED).round()
    }

    /// The smaller of two amounts in the same currency
    pub fn min(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(if self.amount <= other.amount { self.clone() } else { other.clone() })
    }

    /// Round to two decimal places, midpoints away from zero
    pub fn round(&self) -> Money {
        Money::new(
            self.amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            self.currency.clone(),
        )
    }

    /// Greater than zero
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Less than zero
    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Exactly zero
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.same_currency(other) {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                left: self.currency.code().to_string(),
                right: other.currency.code().to_string(),
            })
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero(Currency::default())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.2}", self.currency, self.amount)
    }
}

/// ISO 4217 currency
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Currency {
    /// US dollar
    #[default]
    USD,
    /// Euro
    EUR,
    /// Pound sterling
    GBP,
    /// Canadian dollar
    CAD,
    /// Nigerian naira
    NGN,
    /// Any other ISO code
    Other(String),
}

impl Currency {
    /// Three-letter code
    pub fn code(&self) -> &str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::NGN => "NGN",
            Self::Other(code) => code,
        }
    }

    /// Parse a code, case-insensitive
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_uppercase().as_str() {
            "USD" => Self::USD,
            "EUR" => Self::EUR,
            "GBP" => Self::GBP,
            "CAD" => Self::CAD,
            "NGN" => Self::NGN,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for Currency {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.code().to_string()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Money arithmetic errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Operands carry different currencies
    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch {
        /// Left operand currency
        left: String,
        /// Right operand currency
        right: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_from_cents() {
        let money = Money::from_cents(1050, Currency::USD);
        assert_eq!(money.amount(), dec!(10.50));
    }

    #[test]
    fn test_money_add_and_subtract() {
        let a = Money::new(dec!(10.00), Currency::USD);
        let b = Money::new(dec!(2.50), Currency::USD);
        assert_eq!(a.add(&b).unwrap().amount(), dec!(12.50));
        assert_eq!(a.subtract(&b).unwrap().amount(), dec!(7.50));
    }

    #[test]
    fn test_money_currency_mismatch() {
        let usd = Money::new(dec!(10), Currency::USD);
        let eur = Money::new(dec!(5), Currency::EUR);
        assert!(matches!(usd.add(&eur), Err(MoneyError::CurrencyMismatch { .. })));
        assert!(usd.min(&eur).is_err());
    }

    #[test]
    fn test_percentage_rounds_half_away_from_zero() {
        let money = Money::new(dec!(19.99), Currency::USD);
        // 12.5% of 19.99 = 2.49875
        assert_eq!(money.percentage(dec!(12.5)).amount(), dec!(2.50));
    }

    #[test]
    fn test_min_picks_smaller() {
        let a = Money::new(dec!(3), Currency::GBP);
        let b = Money::new(dec!(4), Currency::GBP);
        assert_eq!(a.min(&b).unwrap(), a);
    }

    #[test]
    fn test_currency_serializes_as_code() {
        let json = serde_json::to_string(&Money::new(dec!(1.25), Currency::EUR)).unwrap();
        assert!(json.contains("\"EUR\""));
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back.currency(), &Currency::EUR);
    }

    #[test]
    fn test_unknown_currency_preserved() {
        assert_eq!(Currency::from_code("kes"), Currency::Other("KES".into()));
    }
}
