//! Storefront commerce
//!
//! Catalog, carts, checkout, payments and promo codes, laid out in layers:
//!
//! - **Domain**: products, carts, orders, payments, promo codes and their events
//! - **Ports**: tenant-scoped repository traits, event publisher, payment gateway
//! - **Application**: services orchestrating the use cases
//! - **Infrastructure**: in-memory adapters and a simulated gateway
//!
//! Every service and repository call takes the request's
//! [`TenantContext`](shop_tenant::TenantContext); adapters never return rows of
//! another tenant.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ports;

pub use application::{
    CartService, CheckoutCommand, OrderService, PaymentService, ProductService, PromoCodeService, PromoQuote,
    Viewer,
};
pub use domain::{
    Cart, CartItem, CommerceEvent, Discount, NewProduct, NewPromoCode, Order, OrderLine, OrderStatus, Payment,
    PaymentStatus, Product, ProductUpdate, PromoCode, PromoCodeUpdate, PromoRejection, PromoStatus,
};
pub use error::CommerceError;
pub use infrastructure::{
    InMemoryCartRepository, InMemoryOrderRepository, InMemoryPaymentRepository, InMemoryProductRepository,
    InMemoryPromoCodeRepository, RecordingEventPublisher, SimulatedGateway,
};
pub use ports::{
    CartRepository, ChargeOutcome, EventPublisher, OrderRepository, PaymentGateway, PaymentRepository,
    ProductRepository, PromoCodeRepository, StockChange,
};
