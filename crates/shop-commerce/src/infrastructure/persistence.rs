//! In-memory repository implementations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use shop_common::{OrderId, PaymentId, ProductId, PromoCodeId, RepositoryError, TenantId, UserId};
use shop_tenant::{TenantContext, TenantScoped};
use std::collections::{HashMap, HashSet};

use crate::domain::{Cart, Order, OrderStatus, Payment, Product, PromoCode, PromoStatus};
use crate::ports::{
    CartRepository, OrderRepository, PaymentRepository, ProductRepository, PromoCodeRepository, StockChange,
};

fn scoped<T: TenantScoped + Clone>(item: Option<&T>, ctx: &TenantContext) -> Option<T> {
    item.filter(|i| i.belongs_to(ctx)).cloned()
}

fn ensure_owned<T: TenantScoped>(item: &T, ctx: &TenantContext) -> Result<(), RepositoryError> {
    if item.belongs_to(ctx) {
        Ok(())
    } else {
        Err(RepositoryError::Storage("entity belongs to another tenant".into()))
    }
}

/// In-memory product catalog
#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, ctx: &TenantContext, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(scoped(self.products.read().get(&id), ctx))
    }

    async fn find_by_sku(&self, ctx: &TenantContext, sku: &str) -> Result<Option<Product>, RepositoryError> {
        Ok(self
            .products
            .read()
            .values()
            .find(|p| p.belongs_to(ctx) && p.sku == sku)
            .cloned())
    }

    async fn list(&self, ctx: &TenantContext) -> Result<Vec<Product>, RepositoryError> {
        let mut products: Vec<_> = self
            .products
            .read()
            .values()
            .filter(|p| p.belongs_to(ctx))
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn insert(&self, ctx: &TenantContext, product: &Product) -> Result<(), RepositoryError> {
        ensure_owned(product, ctx)?;
        let mut products = self.products.write();
        if products.values().any(|p| p.belongs_to(ctx) && p.sku == product.sku) {
            return Err(RepositoryError::Duplicate(product.sku.clone()));
        }
        products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update(&self, ctx: &TenantContext, product: &Product) -> Result<(), RepositoryError> {
        ensure_owned(product, ctx)?;
        let mut products = self.products.write();
        match products.get_mut(&product.id) {
            Some(existing) if existing.belongs_to(ctx) => {
                // stock only moves through apply_stock_changes
                let stock = existing.stock;
                *existing = product.clone();
                existing.stock = stock;
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }

    async fn apply_stock_changes(&self, ctx: &TenantContext, changes: &[StockChange]) -> Result<(), RepositoryError> {
        let mut products = self.products.write();

        // Check everything before touching anything
        let mut next: HashMap<ProductId, i64> = HashMap::new();
        for change in changes {
            let product = products
                .get(&change.product_id)
                .filter(|p| p.belongs_to(ctx))
                .ok_or(RepositoryError::NotFound)?;
            let current = next
                .get(&change.product_id)
                .copied()
                .unwrap_or_else(|| i64::from(product.stock));
            let updated = current + change.delta;
            if updated < 0 || updated > i64::from(u32::MAX) {
                return Err(RepositoryError::Conflict(format!("stock for {} would be {updated}", product.sku)));
            }
            next.insert(change.product_id, updated);
        }

        let now = Utc::now();
        for (id, stock) in next {
            if let Some(product) = products.get_mut(&id) {
                product.stock = stock as u32;
                product.updated_at = now;
            }
        }
        Ok(())
    }
}

/// In-memory carts keyed by (tenant, user)
#[derive(Default)]
pub struct InMemoryCartRepository {
    carts: DashMap<(TenantId, UserId), Cart>,
}

impl InMemoryCartRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn find(&self, ctx: &TenantContext, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.carts.get(&(ctx.tenant_id(), user_id)).map(|c| c.clone()))
    }

    async fn save(&self, ctx: &TenantContext, cart: &Cart) -> Result<(), RepositoryError> {
        ensure_owned(cart, ctx)?;
        self.carts.insert((ctx.tenant_id(), cart.user_id), cart.clone());
        Ok(())
    }

    async fn delete(&self, ctx: &TenantContext, user_id: UserId) -> Result<(), RepositoryError> {
        self.carts.remove(&(ctx.tenant_id(), user_id));
        Ok(())
    }
}

/// Row as persisted; pending domain events are not part of it
fn stored(order: &Order) -> Order {
    let mut row = order.clone();
    row.take_events();
    row
}

/// In-memory orders
#[derive(Default)]
pub struct InMemoryOrderRepository {
    table: RwLock<OrderTable>,
}

#[derive(Default)]
struct OrderTable {
    orders: HashMap<OrderId, Order>,
    /// Orders with a charge in flight
    held: HashSet<OrderId>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect(&self, filter: impl Fn(&Order) -> bool) -> Vec<Order> {
        let mut orders: Vec<_> = self.table.read().orders.values().filter(|o| filter(o)).cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_by_id(&self, ctx: &TenantContext, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(scoped(self.table.read().orders.get(&id), ctx))
    }

    async fn list_for_user(&self, ctx: &TenantContext, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        Ok(self.collect(|o| o.belongs_to(ctx) && o.user_id == user_id))
    }

    async fn list(&self, ctx: &TenantContext) -> Result<Vec<Order>, RepositoryError> {
        Ok(self.collect(|o| o.belongs_to(ctx)))
    }

    async fn insert(&self, ctx: &TenantContext, order: &Order) -> Result<(), RepositoryError> {
        ensure_owned(order, ctx)?;
        let mut table = self.table.write();
        if table.orders.contains_key(&order.id) {
            return Err(RepositoryError::Duplicate(order.id.to_string()));
        }
        table.orders.insert(order.id, stored(order));
        Ok(())
    }

    async fn update_if(&self, ctx: &TenantContext, order: &Order, expected: OrderStatus) -> Result<(), RepositoryError> {
        ensure_owned(order, ctx)?;
        let mut table = self.table.write();
        if table.held.contains(&order.id) {
            return Err(RepositoryError::Conflict(format!("order {} has a payment in progress", order.id)));
        }
        match table.orders.get_mut(&order.id) {
            Some(existing) if existing.belongs_to(ctx) => {
                if existing.status() != expected {
                    return Err(RepositoryError::Conflict(format!(
                        "order {} is {}, expected {expected}",
                        order.id,
                        existing.status()
                    )));
                }
                *existing = stored(order);
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }

    async fn hold_for_payment(&self, ctx: &TenantContext, id: OrderId) -> Result<Order, RepositoryError> {
        let mut table = self.table.write();
        let order = scoped(table.orders.get(&id), ctx).ok_or(RepositoryError::NotFound)?;
        if order.status() != OrderStatus::Pending {
            return Err(RepositoryError::Conflict(format!("order {id} is {}", order.status())));
        }
        if !table.held.insert(id) {
            return Err(RepositoryError::Conflict(format!("order {id} has a payment in progress")));
        }
        Ok(order)
    }

    async fn release_payment_hold(&self, ctx: &TenantContext, order: &Order) -> Result<(), RepositoryError> {
        ensure_owned(order, ctx)?;
        let mut table = self.table.write();
        if !table.held.remove(&order.id) {
            return Err(RepositoryError::Conflict(format!("order {} is not held", order.id)));
        }
        match table.orders.get_mut(&order.id) {
            Some(existing) if existing.belongs_to(ctx) => {
                *existing = stored(order);
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }
}

/// In-memory payments
#[derive(Default)]
pub struct InMemoryPaymentRepository {
    payments: RwLock<HashMap<PaymentId, Payment>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn find_by_id(&self, ctx: &TenantContext, id: PaymentId) -> Result<Option<Payment>, RepositoryError> {
        Ok(scoped(self.payments.read().get(&id), ctx))
    }

    async fn list_for_order(&self, ctx: &TenantContext, order_id: OrderId) -> Result<Vec<Payment>, RepositoryError> {
        let mut payments: Vec<_> = self
            .payments
            .read()
            .values()
            .filter(|p| p.belongs_to(ctx) && p.order_id == order_id)
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.created_at);
        Ok(payments)
    }

    async fn save(&self, ctx: &TenantContext, payment: &Payment) -> Result<(), RepositoryError> {
        ensure_owned(payment, ctx)?;
        self.payments.write().insert(payment.id, payment.clone());
        Ok(())
    }
}

/// In-memory promo codes
#[derive(Default)]
pub struct InMemoryPromoCodeRepository {
    codes: RwLock<HashMap<PromoCodeId, PromoCode>>,
}

impl InMemoryPromoCodeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PromoCodeRepository for InMemoryPromoCodeRepository {
    async fn find_by_id(&self, ctx: &TenantContext, id: PromoCodeId) -> Result<Option<PromoCode>, RepositoryError> {
        Ok(scoped(self.codes.read().get(&id), ctx))
    }

    async fn find_by_code(&self, ctx: &TenantContext, code: &str) -> Result<Option<PromoCode>, RepositoryError> {
        Ok(self
            .codes
            .read()
            .values()
            .find(|p| p.belongs_to(ctx) && p.code == code)
            .cloned())
    }

    async fn list(&self, ctx: &TenantContext) -> Result<Vec<PromoCode>, RepositoryError> {
        let mut codes: Vec<_> = self
            .codes
            .read()
            .values()
            .filter(|p| p.belongs_to(ctx))
            .cloned()
            .collect();
        codes.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(codes)
    }

    async fn insert(&self, ctx: &TenantContext, promo: &PromoCode) -> Result<(), RepositoryError> {
        ensure_owned(promo, ctx)?;
        let mut codes = self.codes.write();
        if codes.values().any(|p| p.belongs_to(ctx) && p.code == promo.code) {
            return Err(RepositoryError::Duplicate(promo.code.clone()));
        }
        codes.insert(promo.id, promo.clone());
        Ok(())
    }

    async fn update(&self, ctx: &TenantContext, promo: &PromoCode) -> Result<(), RepositoryError> {
        ensure_owned(promo, ctx)?;
        let mut codes = self.codes.write();
        match codes.get_mut(&promo.id) {
            Some(existing) if existing.belongs_to(ctx) => {
                // usage_count only moves through increment_usage
                let usage_count = existing.usage_count;
                *existing = promo.clone();
                existing.usage_count = usage_count;
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }

    async fn increment_usage(
        &self,
        ctx: &TenantContext,
        id: PromoCodeId,
        now: DateTime<Utc>,
    ) -> Result<u32, RepositoryError> {
        let mut codes = self.codes.write();
        let promo = codes
            .get_mut(&id)
            .filter(|p| p.belongs_to(ctx))
            .ok_or(RepositoryError::NotFound)?;
        let status = promo.status(now);
        if status != PromoStatus::Active {
            return Err(RepositoryError::Conflict(format!("promo code {} is {status:?}", promo.code)));
        }
        promo.usage_count += 1;
        promo.updated_at = now;
        Ok(promo.usage_count)
    }

    async fn decrement_usage(&self, ctx: &TenantContext, id: PromoCodeId) -> Result<u32, RepositoryError> {
        let mut codes = self.codes.write();
        let promo = codes
            .get_mut(&id)
            .filter(|p| p.belongs_to(ctx))
            .ok_or(RepositoryError::NotFound)?;
        promo.usage_count = promo.usage_count.saturating_sub(1);
        promo.updated_at = Utc::now();
        Ok(promo.usage_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Discount, NewProduct, NewPromoCode, OrderLine};
    use rust_decimal_macros::dec;
    use shop_common::{Currency, Money};
    use uuid::Uuid;

    fn product(ctx: &TenantContext, sku: &str, stock: u32) -> Product {
        Product::create(
            ctx.tenant_id(),
            NewProduct {
                sku: sku.into(),
                name: sku.into(),
                description: String::new(),
                price: Money::from_cents(1000, Currency::USD),
                stock,
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_products_isolated_by_tenant() {
        let repo = InMemoryProductRepository::new();
        let a = TenantContext::new(Uuid::new_v4());
        let b = TenantContext::new(Uuid::new_v4());
        let p = product(&a, "TEE", 1);
        repo.insert(&a, &p).await.unwrap();
        repo.insert(&b, &product(&b, "TEE", 1)).await.unwrap();

        assert!(repo.find_by_id(&b, p.id).await.unwrap().is_none());
        assert_eq!(repo.list(&a).await.unwrap().len(), 1);
        assert!(matches!(
            repo.insert(&a, &product(&a, "TEE", 1)).await,
            Err(RepositoryError::Duplicate(_))
        ));
        assert!(repo.insert(&b, &product(&a, "MUG", 1)).await.is_err());
    }

    #[tokio::test]
    async fn test_stock_changes_all_or_nothing() {
        let repo = InMemoryProductRepository::new();
        let ctx = TenantContext::new(Uuid::new_v4());
        let tee = product(&ctx, "TEE", 5);
        let mug = product(&ctx, "MUG", 1);
        repo.insert(&ctx, &tee).await.unwrap();
        repo.insert(&ctx, &mug).await.unwrap();

        let result = repo
            .apply_stock_changes(
                &ctx,
                &[
                    StockChange { product_id: tee.id, delta: -2 },
                    StockChange { product_id: mug.id, delta: -2 },
                ],
            )
            .await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
        assert_eq!(repo.find_by_id(&ctx, tee.id).await.unwrap().unwrap().stock, 5);

        repo.apply_stock_changes(&ctx, &[StockChange { product_id: tee.id, delta: -5 }])
            .await
            .unwrap();
        assert_eq!(repo.find_by_id(&ctx, tee.id).await.unwrap().unwrap().stock, 0);
    }

    #[tokio::test]
    async fn test_product_update_keeps_stored_stock() {
        let repo = InMemoryProductRepository::new();
        let ctx = TenantContext::new(Uuid::new_v4());
        let tee = product(&ctx, "TEE", 5);
        repo.insert(&ctx, &tee).await.unwrap();

        let mut loaded = repo.find_by_id(&ctx, tee.id).await.unwrap().unwrap();
        repo.apply_stock_changes(&ctx, &[StockChange { product_id: tee.id, delta: -3 }])
            .await
            .unwrap();
        loaded.name = "Renamed".into();
        repo.update(&ctx, &loaded).await.unwrap();

        let stored = repo.find_by_id(&ctx, tee.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Renamed");
        assert_eq!(stored.stock, 2);
    }

    fn order(ctx: &TenantContext) -> Order {
        let line = OrderLine::new(
            Uuid::new_v4(),
            "TEE".into(),
            "Tee".into(),
            Money::from_cents(1000, Currency::USD),
            1,
        );
        Order::place(ctx.tenant_id(), Uuid::new_v4(), "buyer@shop.io".into(), vec![line], None).unwrap()
    }

    #[tokio::test]
    async fn test_order_update_checks_expected_status() {
        let repo = InMemoryOrderRepository::new();
        let ctx = TenantContext::new(Uuid::new_v4());
        let placed = order(&ctx);
        repo.insert(&ctx, &placed).await.unwrap();

        let mut cancelled = placed.clone();
        cancelled.transition_to(OrderStatus::Cancelled).unwrap();
        repo.update_if(&ctx, &cancelled, OrderStatus::Pending).await.unwrap();

        // A writer that still believes the order is pending loses
        let mut paid = placed.clone();
        paid.transition_to(OrderStatus::Paid).unwrap();
        assert!(matches!(
            repo.update_if(&ctx, &paid, OrderStatus::Pending).await,
            Err(RepositoryError::Conflict(_))
        ));
        let mut stored = repo.find_by_id(&ctx, placed.id).await.unwrap().unwrap();
        assert_eq!(stored.status(), OrderStatus::Cancelled);
        assert!(stored.take_events().is_empty());
    }

    #[tokio::test]
    async fn test_payment_hold_blocks_other_writers() {
        let repo = InMemoryOrderRepository::new();
        let ctx = TenantContext::new(Uuid::new_v4());
        let placed = order(&ctx);
        repo.insert(&ctx, &placed).await.unwrap();

        let mut held = repo.hold_for_payment(&ctx, placed.id).await.unwrap();
        assert!(matches!(
            repo.hold_for_payment(&ctx, placed.id).await,
            Err(RepositoryError::Conflict(_))
        ));
        let mut cancelled = placed.clone();
        cancelled.transition_to(OrderStatus::Cancelled).unwrap();
        assert!(matches!(
            repo.update_if(&ctx, &cancelled, OrderStatus::Pending).await,
            Err(RepositoryError::Conflict(_))
        ));

        held.transition_to(OrderStatus::Paid).unwrap();
        repo.release_payment_hold(&ctx, &held).await.unwrap();
        assert_eq!(repo.find_by_id(&ctx, placed.id).await.unwrap().unwrap().status(), OrderStatus::Paid);
        assert!(matches!(
            repo.hold_for_payment(&ctx, placed.id).await,
            Err(RepositoryError::Conflict(_))
        ));
    }

    fn promo(ctx: &TenantContext, code: &str, usage_limit: Option<u32>) -> PromoCode {
        PromoCode::create(
            ctx.tenant_id(),
            NewPromoCode {
                code: code.into(),
                description: String::new(),
                discount: Discount::Percentage { percent: dec!(10) },
                max_discount: None,
                min_purchase: None,
                starts_at: None,
                ends_at: None,
                usage_limit,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_increment_usage_respects_limit() {
        let repo = InMemoryPromoCodeRepository::new();
        let ctx = TenantContext::new(Uuid::new_v4());
        let promo = promo(&ctx, "ONCE", Some(1));
        repo.insert(&ctx, &promo).await.unwrap();

        assert_eq!(repo.increment_usage(&ctx, promo.id, Utc::now()).await.unwrap(), 1);
        assert!(matches!(
            repo.increment_usage(&ctx, promo.id, Utc::now()).await,
            Err(RepositoryError::Conflict(_))
        ));
        assert_eq!(repo.decrement_usage(&ctx, promo.id).await.unwrap(), 0);
        assert_eq!(repo.decrement_usage(&ctx, promo.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_increment_usage_rechecks_status() {
        let repo = InMemoryPromoCodeRepository::new();
        let ctx = TenantContext::new(Uuid::new_v4());
        let loaded = promo(&ctx, "LATE", None);
        repo.insert(&ctx, &loaded).await.unwrap();

        // Disabled by staff after checkout loaded the code
        let mut disabled = loaded.clone();
        disabled.active = false;
        repo.update(&ctx, &disabled).await.unwrap();
        assert!(matches!(
            repo.increment_usage(&ctx, loaded.id, Utc::now()).await,
            Err(RepositoryError::Conflict(_))
        ));

        // Past its end date
        let mut expiring = promo(&ctx, "SOON", None);
        expiring.ends_at = Some(Utc::now() + chrono::Duration::minutes(5));
        repo.insert(&ctx, &expiring).await.unwrap();
        assert!(matches!(
            repo.increment_usage(&ctx, expiring.id, Utc::now() + chrono::Duration::minutes(10)).await,
            Err(RepositoryError::Conflict(_))
        ));
        assert_eq!(repo.find_by_id(&ctx, loaded.id).await.unwrap().unwrap().usage_count, 0);
        assert_eq!(repo.find_by_id(&ctx, expiring.id).await.unwrap().unwrap().usage_count, 0);
    }

    #[tokio::test]
    async fn test_carts_keyed_by_tenant_and_user() {
        let repo = InMemoryCartRepository::new();
        let a = TenantContext::new(Uuid::new_v4());
        let b = TenantContext::new(Uuid::new_v4());
        let user = Uuid::new_v4();

        repo.save(&a, &Cart::new(a.tenant_id(), user)).await.unwrap();
        assert!(repo.find(&a, user).await.unwrap().is_some());
        assert!(repo.find(&b, user).await.unwrap().is_none());

        repo.delete(&a, user).await.unwrap();
        assert!(repo.find(&a, user).await.unwrap().is_none());
    }
}
