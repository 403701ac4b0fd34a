//! Shopping cart aggregate
//!
//! One cart per (tenant, user). Line items snapshot the product price at the
//! time they were added; checkout re-prices them from the catalog.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shop_common::{Currency, Money, ProductId, TenantId, UserId};
use shop_tenant::TenantScoped;

use crate::domain::product::Product;
use crate::error::CommerceError;

/// Cart line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl CartItem {
    /// unit price × quantity
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(Decimal::from(self.quantity))
    }
}

/// A user's cart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Empty cart
    pub fn new(tenant_id: TenantId, user_id: UserId) -> Self {
        Self {
            tenant_id,
            user_id,
            items: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Add units of a product; merges with an existing line and refreshes its price
    pub fn add_item(&mut self, product: &Product, quantity: u32) -> Result<(), CommerceError> {
        if quantity == 0 {
            return Err(CommerceError::Validation("quantity must be at least 1".into()));
        }
        if let Some(currency) = self.currency() {
            if currency != product.price.currency() {
                return Err(CommerceError::Validation(format!(
                    "cart is in {currency}, product is priced in {}",
                    product.price.currency()
                )));
            }
        }

        let existing = self.items.iter().find(|i| i.product_id == product.id).map(|i| i.quantity);
        let total = existing.unwrap_or(0).saturating_add(quantity);
        product.ensure_available(total)?;

        match self.items.iter_mut().find(|i| i.product_id == product.id) {
            Some(item) => {
                item.quantity = total;
                item.unit_price = product.price.clone();
                item.name = product.name.clone();
            }
            None => self.items.push(CartItem {
                product_id: product.id,
                sku: product.sku.clone(),
                name: product.name.clone(),
                unit_price: product.price.clone(),
                quantity,
            }),
        }
        self.touch();
        Ok(())
    }

    /// Set a line's quantity; zero removes the line
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> Result<(), CommerceError> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }
        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or(CommerceError::NotFound("cart item"))?;
        item.quantity = quantity;
        self.touch();
        Ok(())
    }

    /// Drop a line
    pub fn remove_item(&mut self, product_id: ProductId) -> Result<(), CommerceError> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        if self.items.len() == before {
            return Err(CommerceError::NotFound("cart item"));
        }
        self.touch();
        Ok(())
    }

    /// Empty the cart
    pub fn clear(&mut self) {
        self.items.clear();
        self.touch();
    }

    /// No lines
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across lines
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Currency of the first line, if any
    pub fn currency(&self) -> Option<&Currency> {
        self.items.first().map(|i| i.unit_price.currency())
    }

    /// Sum of line totals
    pub fn subtotal(&self) -> Money {
        let currency = self.currency().cloned().unwrap_or_default();
        let amount = self.items.iter().map(|i| i.line_total().amount()).sum::<Decimal>();
        Money::new(amount, currency).round()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl TenantScoped for Cart {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::NewProduct;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn product(tenant: TenantId, sku: &str, cents: i64, stock: u32) -> Product {
        Product::create(
            tenant,
            NewProduct {
                sku: sku.into(),
                name: sku.into(),
                description: String::new(),
                price: Money::from_cents(cents, Currency::USD),
                stock,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_add_merges_and_subtotal() {
        let tenant = Uuid::new_v4();
        let mut cart = Cart::new(tenant, Uuid::new_v4());
        let tee = product(tenant, "TEE", 1999, 10);
        let mug = product(tenant, "MUG", 850, 10);

        cart.add_item(&tee, 1).unwrap();
        cart.add_item(&tee, 2).unwrap();
        cart.add_item(&mug, 1).unwrap();

        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.item_count(), 4);
        assert_eq!(cart.subtotal().amount(), dec!(68.47));
    }

    #[test]
    fn test_add_respects_stock() {
        let tenant = Uuid::new_v4();
        let mut cart = Cart::new(tenant, Uuid::new_v4());
        let tee = product(tenant, "TEE", 1000, 2);

        cart.add_item(&tee, 2).unwrap();
        assert!(matches!(cart.add_item(&tee, 1), Err(CommerceError::InsufficientStock { .. })));
        assert!(cart.add_item(&tee, 0).is_err());
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let tenant = Uuid::new_v4();
        let mut cart = Cart::new(tenant, Uuid::new_v4());
        let tee = product(tenant, "TEE", 1000, 5);
        cart.add_item(&tee, 2).unwrap();

        cart.set_quantity(tee.id, 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.remove_item(tee.id), Err(CommerceError::NotFound("cart item")));
        assert!(cart.subtotal().is_zero());
    }

    #[test]
    fn test_mixed_currency_rejected() {
        let tenant = Uuid::new_v4();
        let mut cart = Cart::new(tenant, Uuid::new_v4());
        cart.add_item(&product(tenant, "TEE", 1000, 5), 1).unwrap();

        let mut euro = product(tenant, "EURO", 1000, 5);
        euro.price = Money::from_cents(1000, Currency::EUR);
        assert!(matches!(cart.add_item(&euro, 1), Err(CommerceError::Validation(_))));
    }
}
