use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::auth;
use crate::errors::AppError;
use crate::services::booking_flow;
use crate::services::payments::{GatewayOrder, PaymentSnapshot};
use crate::state::AppState;

// GET /api/payments/key
pub async fn gateway_key(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    auth::authenticate(&state, &headers).await?;

    if !state.gateway.is_configured() {
        return Err(AppError::GatewayUnavailable);
    }
    Ok(Json(serde_json::json!({ "keyId": state.gateway.key_id() })))
}

// POST /api/payments/order
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub booking_id: Option<String>,
}

pub async fn create_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateOrderRequest>,
) -> Result<Json<GatewayOrder>, AppError> {
    let principal = auth::authenticate(&state, &headers).await?;
    let booking_id = body
        .booking_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::InvalidInput("bookingId is required".to_string()))?;

    let order = booking_flow::open_order(&state, &principal, &booking_id).await?;
    Ok(Json(order))
}

// POST /api/payments/verify
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub booking_id: Option<String>,
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    pub signature: Option<String>,
}

pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let principal = auth::authenticate(&state, &headers).await?;

    let (booking_id, order_id, payment_id, signature) = match (
        body.booking_id.filter(|v| !v.is_empty()),
        body.order_id.filter(|v| !v.is_empty()),
        body.payment_id.filter(|v| !v.is_empty()),
        body.signature.filter(|v| !v.is_empty()),
    ) {
        (Some(b), Some(o), Some(p), Some(s)) => (b, o, p, s),
        _ => {
            return Err(AppError::InvalidInput(
                "missing payment verification fields".to_string(),
            ))
        }
    };

    booking_flow::confirm_payment(
        &state,
        &principal,
        &booking_id,
        &order_id,
        &payment_id,
        &signature,
    )
    .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Payment verified and booking updated",
    })))
}

// GET /api/payments/status/:payment_id
pub async fn payment_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(payment_id): Path<String>,
) -> Result<Json<PaymentSnapshot>, AppError> {
    auth::authenticate(&state, &headers).await?;

    if !state.gateway.is_configured() {
        return Err(AppError::GatewayUnavailable);
    }
    let snapshot = state
        .gateway
        .fetch_payment(&payment_id)
        .await
        .map_err(AppError::Gateway)?;

    Ok(Json(snapshot))
}
