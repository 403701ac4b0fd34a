//! Product aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shop_common::{Money, ProductId, TenantId};
use shop_tenant::TenantScoped;
use uuid::Uuid;

use crate::error::CommerceError;

/// A sellable catalog item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub tenant_id: TenantId,
    /// Stock keeping unit, upper-case, unique per tenant
    pub sku: String,
    pub name: String,
    pub description: String,
    pub price: Money,
    /// Units on hand
    pub stock: u32,
    /// Inactive products stay visible to staff but cannot be bought
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for a new product
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub stock: u32,
}

/// Partial update; `None` leaves the field alone
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub active: Option<bool>,
}

impl Product {
    /// Validate input and build an active product
    pub fn create(tenant_id: TenantId, input: NewProduct) -> Result<Self, CommerceError> {
        let sku = input.sku.trim().to_uppercase();
        if sku.is_empty() {
            return Err(CommerceError::Validation("sku cannot be empty".into()));
        }
        let name = non_empty_name(&input.name)?;
        ensure_positive_price(&input.price)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            tenant_id,
            sku,
            name,
            description: input.description.trim().to_string(),
            price: input.price.round(),
            stock: input.stock,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update
    pub fn apply(&mut self, update: ProductUpdate) -> Result<(), CommerceError> {
        if let Some(name) = update.name {
            self.name = non_empty_name(&name)?;
        }
        if let Some(description) = update.description {
            self.description = description.trim().to_string();
        }
        if let Some(price) = update.price {
            ensure_positive_price(&price)?;
            self.price = price.round();
        }
        if let Some(active) = update.active {
            self.active = active;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Check that `quantity` units can be sold
    pub fn ensure_available(&self, quantity: u32) -> Result<(), CommerceError> {
        if !self.active {
            return Err(CommerceError::ProductUnavailable(self.id));
        }
        if quantity > self.stock {
            return Err(CommerceError::InsufficientStock {
                product_id: self.id,
                requested: quantity,
                available: self.stock,
            });
        }
        Ok(())
    }

    /// Take `quantity` units out of stock
    pub fn reserve(&mut self, quantity: u32) -> Result<(), CommerceError> {
        self.ensure_available(quantity)?;
        self.stock -= quantity;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Put units back
    pub fn restock(&mut self, quantity: u32) {
        self.stock = self.stock.saturating_add(quantity);
        self.updated_at = Utc::now();
    }

    /// Signed stock correction; cannot go below zero
    pub fn adjust_stock(&mut self, delta: i64) -> Result<(), CommerceError> {
        let next = i64::from(self.stock) + delta;
        if next < 0 {
            return Err(CommerceError::InsufficientStock {
                product_id: self.id,
                requested: delta.unsigned_abs().min(u64::from(u32::MAX)) as u32,
                available: self.stock,
            });
        }
        self.stock = u32::try_from(next).map_err(|_| CommerceError::Validation("stock too large".into()))?;
        self.updated_at = Utc::now();
        Ok(())
    }
}

impl TenantScoped for Product {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

fn non_empty_name(name: &str) -> Result<String, CommerceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CommerceError::Validation("name cannot be empty".into()));
    }
    Ok(name.to_string())
}

fn ensure_positive_price(price: &Money) -> Result<(), CommerceError> {
    if !price.is_positive() {
        return Err(CommerceError::Validation("price must be positive".into()));
    }
    Ok(())
}
