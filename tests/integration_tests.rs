use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tower::ServiceExt;

use tourguide::config::AppConfig;
use tourguide::db;
use tourguide::handlers;
use tourguide::models::Booking;
use tourguide::services::identity::{TokenVerifier, VerifiedToken};
use tourguide::services::notify::NotificationSender;
use tourguide::services::payments::{
    verify_order_signature, GatewayOrder, PaymentGateway, PaymentSnapshot,
};
use tourguide::state::AppState;

const TEST_SECRET: &str = "test_gateway_secret";

// ── Mock Providers ──

struct MockVerifier {
    tokens: HashMap<String, (String, String)>,
}

impl MockVerifier {
    fn new() -> Self {
        let mut tokens = HashMap::new();
        tokens.insert(
            "token-u1".to_string(),
            ("u1".to_string(), "u1@example.com".to_string()),
        );
        tokens.insert(
            "token-u2".to_string(),
            ("u2".to_string(), "u2@example.com".to_string()),
        );
        tokens.insert(
            "token-admin".to_string(),
            ("admin-uid".to_string(), "admin@example.com".to_string()),
        );
        Self { tokens }
    }
}

#[async_trait]
impl TokenVerifier for MockVerifier {
    async fn verify(&self, token: &str) -> anyhow::Result<VerifiedToken> {
        match self.tokens.get(token) {
            Some((uid, email)) => Ok(VerifiedToken {
                uid: uid.clone(),
                email: email.clone(),
            }),
            None => anyhow::bail!("unknown token"),
        }
    }
}

struct MockGateway {
    configured: bool,
    orders_created: Arc<Mutex<Vec<i64>>>,
}

impl MockGateway {
    fn new(configured: bool) -> Self {
        Self {
            configured,
            orders_created: Arc::new(Mutex::new(vec![])),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    fn is_configured(&self) -> bool {
        self.configured
    }

    fn key_id(&self) -> &str {
        "rzp_test_mock"
    }

    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        _receipt: &str,
    ) -> anyhow::Result<GatewayOrder> {
        self.orders_created.lock().unwrap().push(amount_minor);
        Ok(GatewayOrder {
            order_id: "order_mock_1".to_string(),
            amount: amount_minor,
            currency: currency.to_string(),
        })
    }

    async fn fetch_payment(&self, _payment_id: &str) -> anyhow::Result<PaymentSnapshot> {
        Ok(PaymentSnapshot {
            status: "captured".to_string(),
            amount: 0.0,
        })
    }

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        verify_order_signature(order_id, payment_id, signature, TEST_SECRET)
    }
}

struct MockNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockNotifier {
    fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(vec![])),
        }
    }
}

#[async_trait]
impl NotificationSender for MockNotifier {
    async fn send_booking_confirmation(
        &self,
        email: &str,
        booking: &Booking,
    ) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), format!("confirmation:{}", booking.id)));
        Ok(())
    }

    async fn send_welcome(&self, email: &str, _name: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), "welcome".to_string()));
        Ok(())
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_uids: vec!["admin-uid".to_string()],
        admin_emails: vec![],
        firebase_api_key: "test-key".to_string(),
        razorpay_key_id: "rzp_test_mock".to_string(),
        razorpay_key_secret: TEST_SECRET.to_string(),
        currency: "INR".to_string(),
        mail_api_key: String::new(),
        mail_domain: String::new(),
        mail_from: "Tour Guide <noreply@tourguide.local>".to_string(),
    }
}

struct TestApp {
    app: Router,
    orders_created: Arc<Mutex<Vec<i64>>>,
    notifications: Arc<Mutex<Vec<(String, String)>>>,
}

fn test_app_with_gateway(configured: bool) -> TestApp {
    let conn = db::init_db(":memory:").unwrap();
    let gateway = MockGateway::new(configured);
    let orders_created = Arc::clone(&gateway.orders_created);
    let notifier = MockNotifier::new();
    let notifications = Arc::clone(&notifier.sent);

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(),
        identity: Box::new(MockVerifier::new()),
        gateway: Box::new(gateway),
        notifier: Box::new(notifier),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/auth/me", get(handlers::users::me))
        .route("/api/users/sync", post(handlers::users::sync_user))
        .route(
            "/api/users/:uid",
            get(handlers::users::get_user).put(handlers::users::update_user),
        )
        .route(
            "/api/bookings",
            post(handlers::bookings::create_booking).get(handlers::bookings::my_bookings),
        )
        .route(
            "/api/bookings/:id",
            get(handlers::bookings::user_bookings).delete(handlers::bookings::delete_booking),
        )
        .route(
            "/api/bookings/:id/mark-paid",
            post(handlers::bookings::mark_paid),
        )
        .route(
            "/api/journeys",
            post(handlers::journeys::create_journey).get(handlers::journeys::my_journeys),
        )
        .route("/api/payments/key", get(handlers::payments::gateway_key))
        .route("/api/payments/order", post(handlers::payments::create_order))
        .route(
            "/api/payments/verify",
            post(handlers::payments::verify_payment),
        )
        .route("/api/admin/overview", get(handlers::admin::admin_overview))
        .with_state(state);

    TestApp {
        app,
        orders_created,
        notifications,
    }
}

fn test_app() -> TestApp {
    test_app_with_gateway(true)
}

fn sign(order_id: &str, payment_id: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(TEST_SECRET.as_bytes()).unwrap();
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create_booking(app: &Router, token: &str, total: f64) -> String {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/api/bookings",
            Some(token),
            Some(serde_json::json!({
                "hotelName": "Taj View",
                "place": "Agra",
                "city": "Agra",
                "days": 2,
                "rooms": 1,
                "perDay": total / 2.0,
                "total": total,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["bookingId"].as_str().unwrap().to_string()
}

async fn booking_by_id(app: &Router, token: &str, booking_id: &str) -> serde_json::Value {
    let (status, body) = send(app, request("GET", "/api/bookings", Some(token), None)).await;
    assert_eq!(status, StatusCode::OK);
    body["bookings"]
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["id"] == booking_id)
        .cloned()
        .unwrap()
}

// ── Tests ──

#[tokio::test]
async fn health_is_public() {
    let t = test_app();
    let (status, body) = send(&t.app, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let t = test_app();
    let (status, _) = send(&t.app, request("GET", "/api/bookings", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_token_is_unauthorized() {
    let t = test_app();
    let (status, _) = send(
        &t.app,
        request("GET", "/api/bookings", Some("bogus"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn booking_requires_hotel_and_place() {
    let t = test_app();
    let (status, _) = send(
        &t.app,
        request(
            "POST",
            "/api/bookings",
            Some("token-u1"),
            Some(serde_json::json!({ "place": "Agra" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn booking_owner_is_the_caller_not_the_body() {
    let t = test_app();
    let (status, body) = send(
        &t.app,
        request(
            "POST",
            "/api/bookings",
            Some("token-u1"),
            Some(serde_json::json!({
                "hotelName": "Taj View",
                "place": "Agra",
                "userId": "someone-else",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let booking = booking_by_id(&t.app, "token-u1", body["bookingId"].as_str().unwrap()).await;
    assert_eq!(booking["userId"], "u1");
}

#[tokio::test]
async fn payment_happy_path_converts_to_minor_units_and_pays_once() {
    let t = test_app();
    let booking_id = create_booking(&t.app, "token-u1", 6000.0).await;

    // Profile row so the confirmation email has an address.
    let (status, _) = send(
        &t.app,
        request("POST", "/api/users/sync", Some("token-u1"), Some(serde_json::json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, order) = send(
        &t.app,
        request(
            "POST",
            "/api/payments/order",
            Some("token-u1"),
            Some(serde_json::json!({ "bookingId": booking_id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["amount"], 600_000);
    assert_eq!(order["currency"], "INR");
    let order_id = order["orderId"].as_str().unwrap().to_string();

    let signature = sign(&order_id, "pay_123");
    let (status, body) = send(
        &t.app,
        request(
            "POST",
            "/api/payments/verify",
            Some("token-u1"),
            Some(serde_json::json!({
                "bookingId": booking_id,
                "orderId": order_id,
                "paymentId": "pay_123",
                "signature": signature,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let booking = booking_by_id(&t.app, "token-u1", &booking_id).await;
    assert_eq!(booking["paymentStatus"], "paid");
    assert_eq!(booking["paymentId"], "pay_123");
    assert_eq!(booking["paymentProvider"], "razorpay");
    assert!(!booking["paidAt"].is_null());

    let notifications = t.notifications.lock().unwrap();
    let confirmations: Vec<_> = notifications
        .iter()
        .filter(|(_, kind)| kind.starts_with("confirmation:"))
        .collect();
    assert_eq!(confirmations.len(), 1);
    assert_eq!(confirmations[0].0, "u1@example.com");
}

#[tokio::test]
async fn tampered_signature_is_rejected_and_booking_stays_pending() {
    let t = test_app();
    let booking_id = create_booking(&t.app, "token-u1", 6000.0).await;

    // Signature computed over a different payment id.
    let signature = sign("order_mock_1", "pay_other");
    let (status, _) = send(
        &t.app,
        request(
            "POST",
            "/api/payments/verify",
            Some("token-u1"),
            Some(serde_json::json!({
                "bookingId": booking_id,
                "orderId": "order_mock_1",
                "paymentId": "pay_123",
                "signature": signature,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let booking = booking_by_id(&t.app, "token-u1", &booking_id).await;
    assert_eq!(booking["paymentStatus"], "pending");
    assert!(booking["paymentId"].is_null());
}

#[tokio::test]
async fn replayed_confirm_is_idempotent() {
    let t = test_app();
    let booking_id = create_booking(&t.app, "token-u1", 1000.0).await;

    let signature = sign("order_mock_1", "pay_123");
    let verify_body = serde_json::json!({
        "bookingId": booking_id,
        "orderId": "order_mock_1",
        "paymentId": "pay_123",
        "signature": signature,
    });

    let (status, _) = send(
        &t.app,
        request("POST", "/api/payments/verify", Some("token-u1"), Some(verify_body.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &t.app,
        request("POST", "/api/payments/verify", Some("token-u1"), Some(verify_body)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let booking = booking_by_id(&t.app, "token-u1", &booking_id).await;
    assert_eq!(booking["paymentStatus"], "paid");
}

#[tokio::test]
async fn zero_total_order_is_rejected_without_gateway_call() {
    let t = test_app();
    let booking_id = create_booking(&t.app, "token-u1", 0.0).await;

    let (status, _) = send(
        &t.app,
        request(
            "POST",
            "/api/payments/order",
            Some("token-u1"),
            Some(serde_json::json!({ "bookingId": booking_id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(t.orders_created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unconfigured_gateway_is_server_error() {
    let t = test_app_with_gateway(false);
    let booking_id = create_booking(&t.app, "token-u1", 500.0).await;

    let (status, _) = send(
        &t.app,
        request(
            "POST",
            "/api/payments/order",
            Some("token-u1"),
            Some(serde_json::json!({ "bookingId": booking_id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _) = send(&t.app, request("GET", "/api/payments/key", Some("token-u1"), None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn order_for_missing_booking_is_not_found() {
    let t = test_app();
    let (status, _) = send(
        &t.app,
        request(
            "POST",
            "/api/payments/order",
            Some("token-u1"),
            Some(serde_json::json!({ "bookingId": "nope" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn foreign_booking_is_forbidden_admin_is_not() {
    let t = test_app();
    let booking_id = create_booking(&t.app, "token-u1", 1000.0).await;

    let (status, _) = send(
        &t.app,
        request("DELETE", &format!("/api/bookings/{booking_id}"), Some("token-u2"), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &t.app,
        request("GET", "/api/bookings/u1", Some("token-u2"), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &t.app,
        request("GET", "/api/bookings/u1", Some("token-admin"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &t.app,
        request("DELETE", &format!("/api/bookings/{booking_id}"), Some("token-admin"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &t.app,
        request("DELETE", &format!("/api/bookings/{booking_id}"), Some("token-admin"), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn foreign_payment_transition_is_forbidden() {
    let t = test_app();
    let booking_id = create_booking(&t.app, "token-u1", 1000.0).await;

    let (status, _) = send(
        &t.app,
        request(
            "POST",
            &format!("/api/bookings/{booking_id}/mark-paid"),
            Some("token-u2"),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Even a correctly signed callback cannot transition someone else's
    // booking.
    let signature = sign("order_mock_1", "pay_123");
    let (status, _) = send(
        &t.app,
        request(
            "POST",
            "/api/payments/verify",
            Some("token-u2"),
            Some(serde_json::json!({
                "bookingId": booking_id,
                "orderId": "order_mock_1",
                "paymentId": "pay_123",
                "signature": signature,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let booking = booking_by_id(&t.app, "token-u1", &booking_id).await;
    assert_eq!(booking["paymentStatus"], "pending");
    assert!(booking["paymentId"].is_null());
}

#[tokio::test]
async fn mark_paid_uses_manual_provider_and_wins_monotonically() {
    let t = test_app();
    let booking_id = create_booking(&t.app, "token-u1", 1000.0).await;

    let (status, _) = send(
        &t.app,
        request(
            "POST",
            &format!("/api/bookings/{booking_id}/mark-paid"),
            Some("token-u1"),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let booking = booking_by_id(&t.app, "token-u1", &booking_id).await;
    assert_eq!(booking["paymentStatus"], "paid");
    assert_eq!(booking["paymentProvider"], "manual");

    // A later gateway callback must not rewrite the already-paid record.
    let signature = sign("order_mock_1", "pay_late");
    let (status, _) = send(
        &t.app,
        request(
            "POST",
            "/api/payments/verify",
            Some("token-u1"),
            Some(serde_json::json!({
                "bookingId": booking_id,
                "orderId": "order_mock_1",
                "paymentId": "pay_late",
                "signature": signature,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let booking = booking_by_id(&t.app, "token-u1", &booking_id).await;
    assert_eq!(booking["paymentProvider"], "manual");
    assert!(booking["paymentId"].is_null());
}

#[tokio::test]
async fn admin_overview_rolls_up_per_user() {
    let t = test_app();

    for token in ["token-u1", "token-u2"] {
        let (status, _) = send(
            &t.app,
            request("POST", "/api/users/sync", Some(token), Some(serde_json::json!({}))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    create_booking(&t.app, "token-u1", 100.0).await;
    create_booking(&t.app, "token-u1", 250.0).await;
    create_booking(&t.app, "token-u2", 75.0).await;

    let (status, _) = send(
        &t.app,
        request("GET", "/api/admin/overview", Some("token-u1"), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &t.app,
        request("GET", "/api/admin/overview", Some("token-admin"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bookings"].as_array().unwrap().len(), 3);

    let users = body["users"].as_array().unwrap();
    let u1 = users.iter().find(|u| u["id"] == "u1").unwrap();
    assert_eq!(u1["bookings"], 2);
    assert_eq!(u1["lastBookingStatus"], "pending");
    let u2 = users.iter().find(|u| u["id"] == "u2").unwrap();
    assert_eq!(u2["bookings"], 1);

    let bookings = body["bookings"].as_array().unwrap();
    assert!(bookings.iter().all(|b| b["userEmail"] != ""));
}

#[tokio::test]
async fn first_sync_creates_profile_and_sends_welcome() {
    let t = test_app();

    let (status, body) = send(
        &t.app,
        request(
            "POST",
            "/api/users/sync",
            Some("token-u1"),
            Some(serde_json::json!({ "phone": "+911234567890" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["uid"], "u1");

    let (status, user) = send(&t.app, request("GET", "/api/users/u1", Some("token-u1"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["email"], "u1@example.com");
    assert_eq!(user["name"], "u1"); // email local part
    assert_eq!(user["phone"], "+911234567890");

    {
        let notifications = t.notifications.lock().unwrap();
        assert_eq!(
            notifications.as_slice(),
            &[("u1@example.com".to_string(), "welcome".to_string())]
        );
    }

    // Second sync is an update, not a second welcome.
    let (status, _) = send(
        &t.app,
        request(
            "POST",
            "/api/users/sync",
            Some("token-u1"),
            Some(serde_json::json!({ "name": "Traveler One" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(t.notifications.lock().unwrap().len(), 1);

    let (_, user) = send(&t.app, request("GET", "/api/users/u1", Some("token-u1"), None)).await;
    assert_eq!(user["name"], "Traveler One");
}

#[tokio::test]
async fn me_reports_admin_flag() {
    let t = test_app();

    let (status, body) = send(&t.app, request("GET", "/api/auth/me", Some("token-u1"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["uid"], "u1");
    assert_eq!(body["isAdmin"], false);

    let (_, body) = send(&t.app, request("GET", "/api/auth/me", Some("token-admin"), None)).await;
    assert_eq!(body["isAdmin"], true);
}

#[tokio::test]
async fn foreign_profile_is_forbidden() {
    let t = test_app();
    let (status, _) = send(
        &t.app,
        request("POST", "/api/users/sync", Some("token-u1"), Some(serde_json::json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&t.app, request("GET", "/api/users/u1", Some("token-u2"), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&t.app, request("GET", "/api/users/u1", Some("token-admin"), None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn journeys_are_scoped_to_owner() {
    let t = test_app();

    let (status, body) = send(
        &t.app,
        request(
            "POST",
            "/api/journeys",
            Some("token-u1"),
            Some(serde_json::json!({ "place": "Jaipur", "nights": 3 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["journeyId"].is_string());

    let (status, body) = send(&t.app, request("GET", "/api/journeys", Some("token-u1"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["journeys"].as_array().unwrap().len(), 1);
    assert_eq!(body["journeys"][0]["userId"], "u1");

    let (status, body) = send(&t.app, request("GET", "/api/journeys", Some("token-u2"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["journeys"].as_array().unwrap().is_empty());
}
