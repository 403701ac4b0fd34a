//! Storefront REST API
//!
//! Multi-tenant e-commerce backend over HTTP.
//!
//! # Architecture
//!
//! ```text
//! request
//!   │
//!   ▼
//! TraceLayer ── CorsLayer
//!   │
//!   ├── /health, /api/v1/platform/*          (no tenant; platform key)
//!   │
//!   ▼
//! tenant_middleware        x-tenant-id ──► TenantContext
//!   │
//!   ▼
//! bruteforce_middleware    login / refresh / register only
//!   │
//!   ▼
//! auth_middleware          Bearer JWT ──► AuthenticatedUser
//!   │
//!   ▼
//! enforce_roles            admin / manager route groups
//!   │
//!   ▼
//! handlers ──► services (identity, commerce) ──► repositories
//!                 │
//!                 └── events ──► NotificationDispatcher ──► email / sms
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod middleware;
pub mod models;
pub mod routes;

use axum::body::Body;
use axum::http::Request;
use axum::routing::get;
use axum::Router;
use shop_commerce::{
    CartService, EventPublisher, InMemoryCartRepository, InMemoryOrderRepository, InMemoryPaymentRepository,
    InMemoryProductRepository, InMemoryPromoCodeRepository, OrderService, PaymentService, ProductService,
    PromoCodeService, SimulatedGateway,
};
use shop_identity::{AuthService, InMemoryUserRepository, PasswordManager, TokenService, UserRepository, UserService};
use shop_notify::{DispatchWorker, NotificationDispatcher, NotificationProvider, TemplateStore};
use shop_tenant::{InMemoryTenantRepository, TenantRegistry, TenantRepository, TenantResolver};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult};
pub use events::NotificationPublisher;
pub use models::*;

/// Shared application state
pub struct AppState {
    pub config: ApiConfig,
    pub tenants: TenantRegistry,
    pub resolver: TenantResolver,
    pub auth: AuthService,
    pub users: UserService,
    pub products: ProductService,
    pub carts: CartService,
    pub orders: OrderService,
    pub payments: PaymentService,
    pub promo_codes: PromoCodeService,
    pub notifier: NotificationDispatcher,
    pub notifications: Arc<NotificationPublisher>,
    pub bruteforce: middleware::BruteforceGuard,
}

impl AppState {
    /// Wire every service over in-memory storage.
    ///
    /// The returned worker delivers queued notifications; spawn it.
    pub fn in_memory(
        config: ApiConfig,
        providers: Vec<Arc<dyn NotificationProvider>>,
    ) -> Result<(Self, DispatchWorker), ApiError> {
        let tenant_repo: Arc<dyn TenantRepository> = Arc::new(InMemoryTenantRepository::new());
        let user_repo: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
        let products_repo = Arc::new(InMemoryProductRepository::new());
        let carts_repo = Arc::new(InMemoryCartRepository::new());
        let orders_repo = Arc::new(InMemoryOrderRepository::new());

        let (notifier, worker) = NotificationDispatcher::new(
            config.notifications.clone(),
            Arc::new(TemplateStore::new()),
            providers,
        );
        let notifications = Arc::new(NotificationPublisher::new(
            notifier.clone(),
            Arc::clone(&tenant_repo),
            Arc::clone(&user_repo),
        ));
        let publisher: Arc<dyn EventPublisher> = notifications.clone();

        let tokens = Arc::new(TokenService::new(config.auth.token_config()));
        let passwords = PasswordManager::new(config.auth.hashing)?;
        let promo_codes = PromoCodeService::new(Arc::new(InMemoryPromoCodeRepository::new()));

        let state = Self {
            tenants: TenantRegistry::new(Arc::clone(&tenant_repo)),
            resolver: TenantResolver::new(tenant_repo),
            auth: AuthService::new(Arc::clone(&user_repo), passwords, Arc::clone(&tokens)),
            users: UserService::new(user_repo, tokens),
            products: ProductService::new(products_repo.clone()),
            carts: CartService::new(carts_repo.clone(), products_repo.clone(), promo_codes.clone()),
            orders: OrderService::new(
                orders_repo.clone(),
                carts_repo,
                products_repo,
                promo_codes.clone(),
                Arc::clone(&publisher),
            ),
            payments: PaymentService::new(
                Arc::new(InMemoryPaymentRepository::new()),
                orders_repo,
                Arc::new(SimulatedGateway::new()),
                publisher,
            ),
            promo_codes,
            notifier,
            notifications,
            bruteforce: middleware::BruteforceGuard::new(config.bruteforce.clone()),
            config,
        };
        Ok((state, worker))
    }
}

/// Build the API router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api/v1", api_routes(&state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                tenant_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
}

fn api_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let tenant_scoped = Router::new()
        .nest("/auth", routes::auth::router(state))
        .nest("/users", routes::users::router(state))
        .nest("/products", routes::products::router(state))
        .nest("/cart", routes::cart::router(state))
        .nest("/orders", routes::orders::router(state))
        .nest("/promo-codes", routes::promo_codes::router(state))
        .nest("/notifications", routes::notifications::router(state))
        .route_layer(axum::middleware::from_fn_with_state(
            Arc::clone(state),
            middleware::tenant_middleware,
        ));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/platform", routes::platform::router(state))
        .merge(tenant_scoped)
}
