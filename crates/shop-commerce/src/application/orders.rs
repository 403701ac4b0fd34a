//! Checkout and order lifecycle

use serde::Deserialize;
use shop_common::{Money, OrderId, Page, PageRequest, RepositoryError, UserId};
use shop_tenant::TenantContext;
use std::sync::Arc;

use crate::application::promo_codes::PromoCodeService;
use crate::application::{publish, stock_conflict, Viewer};
use crate::domain::{Order, OrderLine, OrderStatus};
use crate::error::CommerceError;
use crate::ports::{CartRepository, EventPublisher, OrderRepository, ProductRepository, StockChange};

/// Checkout input
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutCommand {
    pub user_id: UserId,
    pub customer_email: String,
    #[serde(default)]
    pub promo_code: Option<String>,
}

/// Order application service
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    carts: Arc<dyn CartRepository>,
    products: Arc<dyn ProductRepository>,
    promos: PromoCodeService,
    publisher: Arc<dyn EventPublisher>,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        carts: Arc<dyn CartRepository>,
        products: Arc<dyn ProductRepository>,
        promos: PromoCodeService,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self { orders, carts, products, promos, publisher }
    }

    /// Turn the user's cart into a pending order.
    ///
    /// Lines are re-priced from the catalog, stock is reserved, then the promo
    /// code is redeemed. If the order cannot be stored, stock and promo use are
    /// given back.
    pub async fn checkout(&self, ctx: &TenantContext, cmd: CheckoutCommand) -> Result<Order, CommerceError> {
        let cart = self
            .carts
            .find(ctx, cmd.user_id)
            .await?
            .filter(|c| !c.is_empty())
            .ok_or(CommerceError::EmptyCart)?;

        let mut lines = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            let product = self
                .products
                .find_by_id(ctx, item.product_id)
                .await?
                .ok_or(CommerceError::NotFound("product"))?;
            product.ensure_available(item.quantity)?;
            lines.push(OrderLine::new(
                product.id,
                product.sku.clone(),
                product.name.clone(),
                product.price.clone(),
                item.quantity,
            ));
        }

        let currency = lines[0].unit_price.currency().clone();
        let mut subtotal = Money::zero(currency);
        for line in &lines {
            subtotal = subtotal.add(&line.line_total)?;
        }

        // Fail fast before touching stock
        if let Some(code) = &cmd.promo_code {
            self.promos.validate(ctx, code, &subtotal).await?;
        }

        let reservations: Vec<StockChange> = lines
            .iter()
            .map(|l| StockChange { product_id: l.product_id, delta: -i64::from(l.quantity) })
            .collect();
        self.products
            .apply_stock_changes(ctx, &reservations)
            .await
            .map_err(stock_conflict)?;

        let discount = match &cmd.promo_code {
            Some(code) => match self.promos.redeem(ctx, code, &subtotal).await {
                Ok(quote) => Some((quote.code, quote.discount)),
                Err(e) => {
                    self.release_stock(ctx, &lines).await;
                    return Err(e);
                }
            },
            None => None,
        };

        let stored = match Order::place(ctx.tenant_id(), cmd.user_id, cmd.customer_email, lines.clone(), discount) {
            Ok(order) => match self.orders.insert(ctx, &order).await {
                Ok(()) => Ok(order),
                Err(e) => Err(CommerceError::from(e)),
            },
            Err(e) => Err(e),
        };
        let mut order = match stored {
            Ok(order) => order,
            Err(e) => {
                self.release_stock(ctx, &lines).await;
                self.release_promo(ctx, cmd.promo_code.as_deref()).await;
                return Err(e);
            }
        };

        // The order is stored; a leftover cart does not undo it
        if let Err(e) = self.carts.delete(ctx, cmd.user_id).await {
            tracing::warn!(tenant_id = %ctx.tenant_id(), order_id = %order.id, error = %e, "failed to clear cart");
        }

        tracing::info!(
            tenant_id = %ctx.tenant_id(),
            order_id = %order.id,
            total = %order.total,
            promo = ?order.promo_code,
            "order placed"
        );
        publish(&self.publisher, order.take_events()).await;
        Ok(order)
    }

    /// Customers only see their own orders
    pub async fn get(&self, ctx: &TenantContext, id: OrderId, viewer: Viewer) -> Result<Order, CommerceError> {
        self.orders
            .find_by_id(ctx, id)
            .await?
            .filter(|o| viewer.can_see(o.user_id))
            .ok_or(CommerceError::NotFound("order"))
    }

    pub async fn list_for_user(
        &self,
        ctx: &TenantContext,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<Order>, CommerceError> {
        Ok(Page::from_vec(self.orders.list_for_user(ctx, user_id).await?, page))
    }

    /// Every order of the tenant, optionally filtered by status
    pub async fn list_all(
        &self,
        ctx: &TenantContext,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>, CommerceError> {
        let mut orders = self.orders.list(ctx).await?;
        if let Some(status) = status {
            orders.retain(|o| o.status() == status);
        }
        Ok(Page::from_vec(orders, page))
    }

    /// Staff status change. Cancelling restocks the items.
    pub async fn update_status(
        &self,
        ctx: &TenantContext,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<Order, CommerceError> {
        let order = self.get(ctx, id, Viewer::Staff).await?;
        self.transition(ctx, order, next).await
    }

    /// Cancel a pending order and put its items back in stock.
    ///
    /// Promo usage is not returned.
    pub async fn cancel(&self, ctx: &TenantContext, id: OrderId, viewer: Viewer) -> Result<Order, CommerceError> {
        let order = self.get(ctx, id, viewer).await?;
        self.transition(ctx, order, OrderStatus::Cancelled).await
    }

    async fn transition(&self, ctx: &TenantContext, mut order: Order, next: OrderStatus) -> Result<Order, CommerceError> {
        let from = order.status();
        order.transition_to(next)?;
        self.orders.update_if(ctx, &order, from).await.map_err(|e| match e {
            RepositoryError::Conflict(msg) => CommerceError::Conflict(msg),
            other => other.into(),
        })?;

        if next == OrderStatus::Cancelled {
            self.release_stock(ctx, &order.items).await;
        }

        tracing::info!(tenant_id = %ctx.tenant_id(), order_id = %order.id, ?from, to = ?next, "order status changed");
        publish(&self.publisher, order.take_events()).await;
        Ok(order)
    }

    async fn release_promo(&self, ctx: &TenantContext, code: Option<&str>) {
        let Some(code) = code else { return };
        if let Err(e) = self.promos.release(ctx, code).await {
            tracing::error!(tenant_id = %ctx.tenant_id(), %code, error = %e, "failed to return promo code use");
        }
    }

    async fn release_stock(&self, ctx: &TenantContext, lines: &[OrderLine]) {
        let changes: Vec<StockChange> = lines
            .iter()
            .map(|l| StockChange { product_id: l.product_id, delta: i64::from(l.quantity) })
            .collect();
        if let Err(e) = self.products.apply_stock_changes(ctx, &changes).await {
            tracing::error!(tenant_id = %ctx.tenant_id(), error = %e, "failed to release stock");
        }
    }
}
