//! Service wiring shared by the application tests

use chrono::Utc;
use rust_decimal::Decimal;
use shop_common::{Currency, Money};
use shop_tenant::TenantContext;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{CartService, OrderService, PaymentService, ProductService, PromoCodeService};
use crate::domain::{Discount, NewProduct, NewPromoCode, Product, PromoCode};
use crate::infrastructure::{
    InMemoryCartRepository, InMemoryOrderRepository, InMemoryPaymentRepository, InMemoryProductRepository,
    InMemoryPromoCodeRepository, RecordingEventPublisher, SimulatedGateway,
};
use crate::ports::{CartRepository, EventPublisher, OrderRepository, PaymentGateway, ProductRepository};

pub(crate) struct Fixture {
    pub ctx: TenantContext,
    pub products: ProductService,
    pub carts: CartService,
    pub promos: PromoCodeService,
    pub orders: OrderService,
    pub payments: PaymentService,
    pub events: Arc<RecordingEventPublisher>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_adapters(
            Arc::new(InMemoryOrderRepository::new()),
            Arc::new(InMemoryCartRepository::new()),
            Arc::new(SimulatedGateway::new()),
        )
    }

    /// Services over the given order/cart storage and gateway
    pub fn with_adapters(
        order_repo: Arc<dyn OrderRepository>,
        cart_repo: Arc<dyn CartRepository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let product_repo: Arc<dyn ProductRepository> = Arc::new(InMemoryProductRepository::new());
        let events = Arc::new(RecordingEventPublisher::new());
        let publisher: Arc<dyn EventPublisher> = events.clone();

        let promos = PromoCodeService::new(Arc::new(InMemoryPromoCodeRepository::new()));
        Self {
            ctx: TenantContext::new(Uuid::new_v4()),
            products: ProductService::new(Arc::clone(&product_repo)),
            carts: CartService::new(Arc::clone(&cart_repo), Arc::clone(&product_repo), promos.clone()),
            orders: OrderService::new(
                Arc::clone(&order_repo),
                cart_repo,
                product_repo,
                promos.clone(),
                Arc::clone(&publisher),
            ),
            payments: PaymentService::new(Arc::new(InMemoryPaymentRepository::new()), order_repo, gateway, publisher),
            promos,
            events,
        }
    }

    pub fn new_product(sku: &str, cents: i64, stock: u32) -> NewProduct {
        NewProduct {
            sku: sku.into(),
            name: format!("Product {sku}"),
            description: String::new(),
            price: Money::from_cents(cents, Currency::USD),
            stock,
        }
    }

    pub async fn product(&self, sku: &str, cents: i64, stock: u32) -> Product {
        self.products
            .create(&self.ctx, Self::new_product(sku, cents, stock))
            .await
            .unwrap()
    }

    pub async fn percent_promo(&self, code: &str, percent: Decimal, usage_limit: Option<u32>) -> PromoCode {
        self.promos
            .create(
                &self.ctx,
                NewPromoCode {
                    code: code.into(),
                    description: String::new(),
                    discount: Discount::Percentage { percent },
                    max_discount: None,
                    min_purchase: None,
                    starts_at: Some(Utc::now() - chrono::Duration::minutes(1)),
                    ends_at: None,
                    usage_limit,
                },
            )
            .await
            .unwrap()
    }
}
