use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use tourguide::config::AppConfig;
use tourguide::db;
use tourguide::handlers;
use tourguide::services::identity::firebase::FirebaseTokenVerifier;
use tourguide::services::notify::mailer::MailgunSender;
use tourguide::services::payments::razorpay::RazorpayGateway;
use tourguide::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    anyhow::ensure!(
        !config.firebase_api_key.is_empty(),
        "FIREBASE_API_KEY must be set"
    );
    if config.razorpay_key_id.is_empty() || config.razorpay_key_secret.is_empty() {
        tracing::warn!("payment gateway keys missing, payment endpoints will be unavailable");
    }
    if config.mail_api_key.is_empty() {
        tracing::warn!("mail API key missing, notifications will be logged and dropped");
    }

    let identity = FirebaseTokenVerifier::new(config.firebase_api_key.clone());
    let gateway = RazorpayGateway::new(
        config.razorpay_key_id.clone(),
        config.razorpay_key_secret.clone(),
    );
    let notifier = MailgunSender::new(
        config.mail_api_key.clone(),
        config.mail_domain.clone(),
        config.mail_from.clone(),
    );

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        identity: Box::new(identity),
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
        .route(
            "/api/journeys/:id",
            get(handlers::journeys::user_journeys).delete(handlers::journeys::delete_journey),
        )
        .route("/api/photos", post(handlers::photos::save_photo))
        .route(
            "/api/photos/:id",
            get(handlers::photos::user_photos).delete(handlers::photos::delete_photo),
        )
        .route("/api/visits", post(handlers::visits::create_visit))
        .route("/api/visits/:id", get(handlers::visits::user_visits))
        .route("/api/payments/key", get(handlers::payments::gateway_key))
        .route("/api/payments/order", post(handlers::payments::create_order))
        .route(
            "/api/payments/verify",
            post(handlers::payments::verify_payment),
        )
        .route(
            "/api/payments/status/:id",
            get(handlers::payments::payment_status),
        )
        .route("/api/admin/overview", get(handlers::admin::admin_overview))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
