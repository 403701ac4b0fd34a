//! End-to-end HTTP tests against the in-memory server

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use shop_api::{build_router, ApiConfig, AppState};
use shop_identity::HashingCost;
use shop_notify::{Channel, MemoryProvider, NotificationProvider};
use std::sync::Arc;
use std::time::Duration;

const PLATFORM_KEY: &str = "platform-test-key";
const ADMIN_EMAIL: &str = "owner@example.com";
const ADMIN_PASSWORD: &str = "owner-password";

struct Harness {
    server: TestServer,
    email: Arc<MemoryProvider>,
}

fn config() -> ApiConfig {
    let mut config = ApiConfig::default();
    config.auth.jwt_secret = "integration-test-secret-with-enough-bytes".into();
    config.auth.hashing = HashingCost { memory_kib: 64, iterations: 1 };
    config.platform_key = PLATFORM_KEY.into();
    config.notifications.base_delay_ms = 1;
    config
}

fn harness() -> Harness {
    let email = Arc::new(MemoryProvider::new(Channel::Email));
    let (state, worker) =
        AppState::in_memory(config(), vec![email.clone() as Arc<dyn NotificationProvider>]).unwrap();
    tokio::spawn(worker.run());
    let server = TestServer::new(build_router(Arc::new(state))).unwrap();
    Harness { server, email }
}

fn scoped(request: TestRequest, tenant: &str, token: Option<&str>) -> TestRequest {
    scoped_from(request, tenant, token, "198.51.100.7")
}

fn scoped_from(request: TestRequest, tenant: &str, token: Option<&str>, ip: &str) -> TestRequest {
    let request = request
        .add_header(HeaderName::from_static("x-tenant-id"), HeaderValue::from_str(tenant).unwrap())
        .add_header(HeaderName::from_static("x-forwarded-for"), HeaderValue::from_str(ip).unwrap());
    match token {
        Some(token) => request.add_header(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        ),
        None => request,
    }
}

fn platform(request: TestRequest) -> TestRequest {
    request.add_header(HeaderName::from_static("x-platform-key"), HeaderValue::from_static(PLATFORM_KEY))
}

fn amount(money: &Value) -> Decimal {
    money["amount"].as_str().unwrap().parse().unwrap()
}

fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap()
}

impl Harness {
    /// New tenant with an admin; returns the tenant id
    async fn tenant(&self, slug: &str) -> String {
        let response = platform(self.server.post("/api/v1/platform/tenants"))
            .json(&json!({
                "slug": slug,
                "name": format!("{slug} shop"),
                "admin": { "email": ADMIN_EMAIL, "name": "Owner", "password": ADMIN_PASSWORD }
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let body = response.json::<Value>();
        assert_eq!(body["data"]["admin"]["roles"], json!(["admin"]));
        body["data"]["tenant"]["id"].as_str().unwrap().to_string()
    }

    async fn login(&self, tenant: &str, email: &str, password: &str) -> Value {
        scoped(self.server.post("/api/v1/auth/login"), tenant, None)
            .json(&json!({ "email": email, "password": password }))
            .await
            .json::<Value>()
    }

    async fn access_token(&self, tenant: &str, email: &str, password: &str) -> String {
        let body = self.login(tenant, email, password).await;
        body["data"]["tokens"]["access_token"].as_str().unwrap().to_string()
    }

    async fn customer(&self, tenant: &str, email: &str) -> String {
        let response = scoped(self.server.post("/api/v1/auth/register"), tenant, None)
            .json(&json!({ "email": email, "name": "Casey", "password": "customer-pass" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        self.access_token(tenant, email, "customer-pass").await
    }

    async fn product(&self, tenant: &str, admin: &str, sku: &str, price: &str, stock: u32) -> String {
        let response = scoped(self.server.post("/api/v1/products"), tenant, Some(admin))
            .json(&json!({
                "sku": sku,
                "name": format!("Product {sku}"),
                "price": { "amount": price, "currency": "USD" },
                "stock": stock
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        response.json::<Value>()["data"]["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health() {
    let h = harness();
    let response = h.server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn test_tenant_header_resolution() {
    let h = harness();
    let tenant_id = h.tenant("acme").await;

    let missing = h.server.get("/api/v1/products").await;
    assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);
    let body = missing.json::<Value>();
    assert_eq!(body["success"], false);
    assert_eq!(body["data"], Value::Null);
    assert_eq!(error_code(&body), "TENANT_REQUIRED");

    let unknown = scoped(h.server.get("/api/v1/products"), "nope", None).await;
    assert_eq!(unknown.status_code(), StatusCode::NOT_FOUND);

    let by_slug = scoped(h.server.get("/api/v1/products"), "ACME", None).await;
    assert_eq!(by_slug.status_code(), StatusCode::OK);
    let by_id = scoped(h.server.get("/api/v1/products"), &tenant_id, None).await;
    assert_eq!(by_id.status_code(), StatusCode::OK);

    let suspended = platform(h.server.post(&format!("/api/v1/platform/tenants/{tenant_id}/suspend"))).await;
    assert_eq!(suspended.status_code(), StatusCode::OK);
    let blocked = scoped(h.server.get("/api/v1/products"), "acme", None).await;
    assert_eq!(blocked.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(&blocked.json::<Value>()), "TENANT_INACTIVE");
}

#[tokio::test]
async fn test_platform_key_required() {
    let h = harness();
    let response = h.server.get("/api/v1/platform/tenants").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let wrong = h
        .server
        .get("/api/v1/platform/tenants")
        .add_header(HeaderName::from_static("x-platform-key"), HeaderValue::from_static("guess"))
        .await;
    assert_eq!(wrong.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_login_refresh_logout() {
    let h = harness();
    h.tenant("acme").await;

    let registered = scoped(h.server.post("/api/v1/auth/register"), "acme", None)
        .json(&json!({ "email": "Ann@Example.com", "name": "Ann", "password": "long-enough" }))
        .await;
    assert_eq!(registered.status_code(), StatusCode::OK);
    let user = registered.json::<Value>()["data"].clone();
    assert_eq!(user["email"], "ann@example.com");
    assert_eq!(user["roles"], json!(["customer"]));
    assert!(user.get("password_hash").is_none());

    let duplicate = scoped(h.server.post("/api/v1/auth/register"), "acme", None)
        .json(&json!({ "email": "ann@example.com", "name": "Ann", "password": "long-enough" }))
        .await;
    assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);

    let login = h.login("acme", "ann@example.com", "long-enough").await;
    let access = login["data"]["tokens"]["access_token"].as_str().unwrap().to_string();
    let refresh = login["data"]["tokens"]["refresh_token"].as_str().unwrap().to_string();
    assert_eq!(login["data"]["tokens"]["token_type"], "Bearer");

    let me = scoped(h.server.get("/api/v1/users/me"), "acme", Some(&access)).await;
    assert_eq!(me.status_code(), StatusCode::OK);
    assert_eq!(me.json::<Value>()["data"]["name"], "Ann");

    let rotated = scoped(h.server.post("/api/v1/auth/refresh"), "acme", None)
        .json(&json!({ "refresh_token": refresh }))
        .await;
    assert_eq!(rotated.status_code(), StatusCode::OK);
    let new_refresh = rotated.json::<Value>()["data"]["refresh_token"].as_str().unwrap().to_string();

    let reused = scoped(h.server.post("/api/v1/auth/refresh"), "acme", None)
        .json(&json!({ "refresh_token": refresh }))
        .await;
    assert_eq!(reused.status_code(), StatusCode::UNAUTHORIZED);

    let logout = scoped(h.server.post("/api/v1/auth/logout"), "acme", Some(&access)).await;
    assert_eq!(logout.status_code(), StatusCode::OK);
    let after_logout = scoped(h.server.post("/api/v1/auth/refresh"), "acme", None)
        .json(&json!({ "refresh_token": new_refresh }))
        .await;
    assert_eq!(after_logout.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tokens_do_not_cross_tenants() {
    let h = harness();
    h.tenant("acme").await;
    h.tenant("globex").await;

    let acme_token = h.customer("acme", "sam@example.com").await;
    // Same email is a different account in another tenant
    let globex_token = h.customer("globex", "sam@example.com").await;
    assert_ne!(acme_token, globex_token);

    let crossed = scoped(h.server.get("/api/v1/users/me"), "globex", Some(&acme_token)).await;
    assert_eq!(crossed.status_code(), StatusCode::FORBIDDEN);

    let missing = scoped(h.server.get("/api/v1/users/me"), "acme", None).await;
    assert_eq!(missing.status_code(), StatusCode::UNAUTHORIZED);

    let garbage = scoped(h.server.get("/api/v1/users/me"), "acme", Some("not-a-jwt")).await;
    assert_eq!(garbage.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&garbage.json::<Value>()), "INVALID_TOKEN");
}

#[tokio::test]
async fn test_login_bruteforce_guard() {
    let h = harness();
    h.tenant("acme").await;

    for _ in 0..5 {
        let response = scoped(h.server.post("/api/v1/auth/login"), "acme", None)
            .json(&json!({ "email": ADMIN_EMAIL, "password": "wrong-password" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }

    let blocked = scoped(h.server.post("/api/v1/auth/login"), "acme", None)
        .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .await;
    assert_eq!(blocked.status_code(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = blocked.header(header::RETRY_AFTER).to_str().unwrap().parse().unwrap();
    assert!(retry_after > 0 && retry_after <= 15 * 60);
    assert_eq!(error_code(&blocked.json::<Value>()), "TOO_MANY_REQUESTS");

    // Another client address has its own counter
    let other = scoped_from(h.server.post("/api/v1/auth/login"), "acme", None, "192.0.2.44")
        .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .await;
    assert_eq!(other.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_successful_login_clears_counter() {
    let h = harness();
    h.tenant("acme").await;
    let attempt = |password: &'static str| {
        scoped(h.server.post("/api/v1/auth/login"), "acme", None)
            .json(&json!({ "email": ADMIN_EMAIL, "password": password }))
    };

    for _ in 0..4 {
        assert_eq!(attempt("wrong-password").await.status_code(), StatusCode::UNAUTHORIZED);
    }
    assert_eq!(attempt(ADMIN_PASSWORD).await.status_code(), StatusCode::OK);
    for _ in 0..5 {
        assert_eq!(attempt("wrong-password").await.status_code(), StatusCode::UNAUTHORIZED);
    }
    assert_eq!(attempt(ADMIN_PASSWORD).await.status_code(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_registration_limit() {
    let h = harness();
    h.tenant("acme").await;

    for i in 0..3 {
        let response = scoped(h.server.post("/api/v1/auth/register"), "acme", None)
            .json(&json!({ "email": format!("user{i}@example.com"), "name": "U", "password": "password-1" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }
    let fourth = scoped(h.server.post("/api/v1/auth/register"), "acme", None)
        .json(&json!({ "email": "user4@example.com", "name": "U", "password": "password-1" }))
        .await;
    assert_eq!(fourth.status_code(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_role_guard() {
    let h = harness();
    h.tenant("acme").await;
    let admin = h.access_token("acme", ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let customer = h.customer("acme", "cus@example.com").await;

    let forbidden = scoped(h.server.post("/api/v1/products"), "acme", Some(&customer))
        .json(&json!({ "sku": "x", "name": "X", "price": { "amount": "1.00", "currency": "USD" } }))
        .await;
    assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(&forbidden.json::<Value>()), "FORBIDDEN");

    let users = scoped(h.server.get("/api/v1/users"), "acme", Some(&customer)).await;
    assert_eq!(users.status_code(), StatusCode::FORBIDDEN);

    let listed = scoped(h.server.get("/api/v1/users"), "acme", Some(&admin)).await;
    assert_eq!(listed.status_code(), StatusCode::OK);
    let body = listed.json::<Value>();
    assert_eq!(body["data"]["total"], 2);

    // Promote the customer; the new role applies on the next request
    let customer_id = body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["email"] == "cus@example.com")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();
    let promoted = scoped(h.server.put(&format!("/api/v1/users/{customer_id}/roles")), "acme", Some(&admin))
        .json(&json!({ "roles": ["manager"] }))
        .await;
    assert_eq!(promoted.status_code(), StatusCode::OK);

    let allowed = scoped(h.server.post("/api/v1/products"), "acme", Some(&customer))
        .json(&json!({ "sku": "x", "name": "X", "price": { "amount": "1.00", "currency": "USD" } }))
        .await;
    assert_eq!(allowed.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_disabled_user_is_locked_out() {
    let h = harness();
    h.tenant("acme").await;
    let admin = h.access_token("acme", ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let customer = h.customer("acme", "cus@example.com").await;

    let me = scoped(h.server.get("/api/v1/users/me"), "acme", Some(&customer)).await;
    let id = me.json::<Value>()["data"]["id"].as_str().unwrap().to_string();

    let disabled = scoped(h.server.put(&format!("/api/v1/users/{id}/active")), "acme", Some(&admin))
        .json(&json!({ "active": false }))
        .await;
    assert_eq!(disabled.status_code(), StatusCode::OK);

    let rejected = scoped(h.server.get("/api/v1/cart"), "acme", Some(&customer)).await;
    assert_eq!(rejected.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_checkout_promo_and_payment() {
    let h = harness();
    h.tenant("acme").await;
    let admin = h.access_token("acme", ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let customer = h.customer("acme", "buyer@example.com").await;
    let product = h.product("acme", &admin, "tee-1", "20.00", 5).await;

    let promo = scoped(h.server.post("/api/v1/promo-codes"), "acme", Some(&admin))
        .json(&json!({
            "code": "save10",
            "discount": { "type": "percentage", "percent": "10" },
            "usage_limit": 1
        }))
        .await;
    assert_eq!(promo.status_code(), StatusCode::OK);
    let promo = promo.json::<Value>();
    assert_eq!(promo["data"]["code"], "SAVE10");
    assert_eq!(promo["data"]["status"], "active");

    let cart = scoped(h.server.post("/api/v1/cart/items"), "acme", Some(&customer))
        .json(&json!({ "product_id": product, "quantity": 2 }))
        .await;
    assert_eq!(cart.status_code(), StatusCode::OK);
    assert_eq!(amount(&cart.json::<Value>()["data"]["subtotal"]), dec!(40));

    let quote = scoped(h.server.get("/api/v1/cart/promo"), "acme", Some(&customer))
        .add_query_param("code", "SAVE10")
        .await;
    assert_eq!(quote.status_code(), StatusCode::OK);
    assert_eq!(amount(&quote.json::<Value>()["data"]["discount"]), dec!(4));

    let order = scoped(h.server.post("/api/v1/orders"), "acme", Some(&customer))
        .json(&json!({ "promo_code": "save10" }))
        .await;
    assert_eq!(order.status_code(), StatusCode::OK);
    let order = order.json::<Value>()["data"].clone();
    assert_eq!(order["status"], "pending");
    assert_eq!(amount(&order["total"]), dec!(36));
    let order_id = order["id"].as_str().unwrap().to_string();

    let emptied = scoped(h.server.get("/api/v1/cart"), "acme", Some(&customer)).await;
    assert_eq!(emptied.json::<Value>()["data"]["item_count"], 0);

    let stock = scoped(h.server.get(&format!("/api/v1/products/{product}")), "acme", None).await;
    assert_eq!(stock.json::<Value>()["data"]["stock"], 3);

    let declined = scoped(h.server.post(&format!("/api/v1/orders/{order_id}/payments")), "acme", Some(&customer))
        .json(&json!({ "method": "fail-card" }))
        .await;
    assert_eq!(declined.status_code(), StatusCode::PAYMENT_REQUIRED);
    assert_eq!(error_code(&declined.json::<Value>()), "PAYMENT_DECLINED");

    let paid = scoped(h.server.post(&format!("/api/v1/orders/{order_id}/payments")), "acme", Some(&customer))
        .json(&json!({ "method": "tok_visa" }))
        .await;
    assert_eq!(paid.status_code(), StatusCode::OK);
    assert_eq!(paid.json::<Value>()["data"]["status"], "completed");

    let attempts = scoped(h.server.get(&format!("/api/v1/orders/{order_id}/payments")), "acme", Some(&customer)).await;
    let statuses: Vec<Value> = attempts.json::<Value>()["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["status"].clone())
        .collect();
    assert_eq!(statuses.len(), 2);
    assert!(statuses.contains(&json!("failed")));
    assert!(statuses.contains(&json!("completed")));

    let shipped = scoped(h.server.put(&format!("/api/v1/orders/{order_id}/status")), "acme", Some(&admin))
        .json(&json!({ "status": "shipped" }))
        .await;
    assert_eq!(shipped.status_code(), StatusCode::OK);
    assert_eq!(shipped.json::<Value>()["data"]["status"], "shipped");

    let backwards = scoped(h.server.put(&format!("/api/v1/orders/{order_id}/status")), "acme", Some(&admin))
        .json(&json!({ "status": "pending" }))
        .await;
    assert_eq!(backwards.status_code(), StatusCode::CONFLICT);

    // Promo usage limit of one is used up
    scoped(h.server.post("/api/v1/cart/items"), "acme", Some(&customer))
        .json(&json!({ "product_id": product, "quantity": 1 }))
        .await;
    let exhausted = scoped(h.server.post("/api/v1/orders"), "acme", Some(&customer))
        .json(&json!({ "promo_code": "SAVE10" }))
        .await;
    assert_eq!(exhausted.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&exhausted.json::<Value>()), "PROMO_REJECTED");

    // Shipping is the last event queued for this order
    let shipped_subject = format!("Order {order_id} is now shipped");
    let subjects = || -> Vec<String> { h.email.sent().into_iter().filter_map(|m| m.subject).collect() };
    for _ in 0..200 {
        if subjects().contains(&shipped_subject) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let subjects = subjects();
    assert!(subjects.iter().any(|s| s.starts_with("Welcome to acme shop")));
    assert!(subjects.contains(&format!("Order {order_id} received")));
    assert!(subjects.contains(&format!("Payment failed for order {order_id}")));
    assert!(subjects.contains(&shipped_subject));

    let deliveries = scoped(h.server.get("/api/v1/notifications/deliveries"), "acme", Some(&admin)).await;
    assert_eq!(deliveries.status_code(), StatusCode::OK);
    assert!(deliveries.json::<Value>()["data"].as_array().unwrap().len() >= 5);
}

#[tokio::test]
async fn test_cancel_restocks_and_hides_foreign_orders() {
    let h = harness();
    h.tenant("acme").await;
    let admin = h.access_token("acme", ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let buyer = h.customer("acme", "buyer@example.com").await;
    let snoop = h.customer("acme", "snoop@example.com").await;
    let product = h.product("acme", &admin, "mug", "8.50", 4).await;

    let empty = scoped(h.server.post("/api/v1/orders"), "acme", Some(&buyer)).await;
    assert_eq!(empty.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&empty.json::<Value>()), "EMPTY_CART");

    let too_many = scoped(h.server.post("/api/v1/cart/items"), "acme", Some(&buyer))
        .json(&json!({ "product_id": product, "quantity": 9 }))
        .await;
    assert_eq!(too_many.status_code(), StatusCode::CONFLICT);
    assert_eq!(error_code(&too_many.json::<Value>()), "INSUFFICIENT_STOCK");

    scoped(h.server.post("/api/v1/cart/items"), "acme", Some(&buyer))
        .json(&json!({ "product_id": product, "quantity": 3 }))
        .await;
    let order = scoped(h.server.post("/api/v1/orders"), "acme", Some(&buyer)).await;
    let order_id = order.json::<Value>()["data"]["id"].as_str().unwrap().to_string();

    let hidden = scoped(h.server.get(&format!("/api/v1/orders/{order_id}")), "acme", Some(&snoop)).await;
    assert_eq!(hidden.status_code(), StatusCode::NOT_FOUND);
    let staff_view = scoped(h.server.get(&format!("/api/v1/orders/{order_id}")), "acme", Some(&admin)).await;
    assert_eq!(staff_view.status_code(), StatusCode::OK);

    let all = scoped(h.server.get("/api/v1/orders/all"), "acme", Some(&admin))
        .add_query_param("status", "pending")
        .await;
    assert_eq!(all.json::<Value>()["data"]["total"], 1);
    let own = scoped(h.server.get("/api/v1/orders"), "acme", Some(&snoop)).await;
    assert_eq!(own.json::<Value>()["data"]["total"], 0);

    let cancelled = scoped(h.server.post(&format!("/api/v1/orders/{order_id}/cancel")), "acme", Some(&buyer)).await;
    assert_eq!(cancelled.status_code(), StatusCode::OK);
    assert_eq!(cancelled.json::<Value>()["data"]["status"], "cancelled");

    let product = scoped(h.server.get(&format!("/api/v1/products/{product}")), "acme", None).await;
    assert_eq!(product.json::<Value>()["data"]["stock"], 4);
}

#[tokio::test]
async fn test_template_override() {
    let h = harness();
    h.tenant("acme").await;
    let admin = h.access_token("acme", ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let saved = scoped(h.server.put("/api/v1/notifications/templates"), "acme", Some(&admin))
        .json(&json!({ "kind": "user_registered", "channel": "email", "body": "Hello {{ name }} from {{ shop }}" }))
        .await;
    assert_eq!(saved.status_code(), StatusCode::OK);
    assert_eq!(saved.json::<Value>()["data"]["overridden"], true);

    h.customer("acme", "newbie@example.com").await;
    for _ in 0..100 {
        if h.email.sent().iter().any(|m| m.to == "newbie@example.com") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let welcome = h.email.sent().into_iter().find(|m| m.to == "newbie@example.com").unwrap();
    assert_eq!(welcome.body, "Hello Casey from acme shop");

    let reset = scoped(h.server.delete("/api/v1/notifications/templates/user_registered/email"), "acme", Some(&admin)).await;
    assert_eq!(reset.json::<Value>()["data"]["removed"], true);

    let listed = scoped(h.server.get("/api/v1/notifications/templates"), "acme", Some(&admin)).await;
    let entries = listed.json::<Value>()["data"].as_array().unwrap().clone();
    assert_eq!(entries.len(), 10);
    assert!(entries.iter().all(|e| e["overridden"] == false));
}
