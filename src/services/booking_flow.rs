use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{self, Principal};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, PaymentStatus};
use crate::services::payments::GatewayOrder;
use crate::state::AppState;

pub const GATEWAY_PROVIDER: &str = "razorpay";
pub const MANUAL_PROVIDER: &str = "manual";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    pub hotel_name: Option<String>,
    pub hotel_address: Option<String>,
    pub place: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "type")]
    pub room_type: Option<String>,
    pub type_label: Option<String>,
    pub days: Option<i64>,
    pub rooms: Option<i64>,
    pub per_day: Option<f64>,
    pub total: Option<f64>,
}

pub fn to_minor_units(total: f64) -> i64 {
    (total * 100.0).round() as i64
}

fn load_booking(state: &AppState, booking_id: &str) -> Result<Booking, AppError> {
    let db = state.db.lock().unwrap();
    queries::get_booking(&db, booking_id)?
        .ok_or_else(|| AppError::NotFound("booking not found".to_string()))
}

/// Persist a new pending booking owned by the caller. The owner comes from
/// the principal, never from the request body.
pub fn create_booking(
    state: &AppState,
    principal: &Principal,
    draft: BookingDraft,
) -> Result<String, AppError> {
    let hotel_name = draft.hotel_name.as_deref().unwrap_or("").trim().to_string();
    let place = draft.place.as_deref().unwrap_or("").trim().to_string();
    if hotel_name.is_empty() || place.is_empty() {
        return Err(AppError::InvalidInput(
            "hotel name and place are required".to_string(),
        ));
    }

    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        user_id: principal.id.clone(),
        hotel_name,
        hotel_address: draft.hotel_address.unwrap_or_default(),
        place,
        city: draft.city.unwrap_or_default(),
        room_type: draft.room_type.unwrap_or_else(|| "normal".to_string()),
        room_type_label: draft.type_label.unwrap_or_else(|| "Normal".to_string()),
        days: draft.days.unwrap_or(1).max(1),
        rooms: draft.rooms.unwrap_or(1).max(1),
        per_day: draft.per_day.unwrap_or(0.0).max(0.0),
        total: draft.total.unwrap_or(0.0).max(0.0),
        payment_status: PaymentStatus::Pending,
        payment_provider: GATEWAY_PROVIDER.to_string(),
        payment_order_id: None,
        payment_id: None,
        paid_at: None,
        created_at: Utc::now().naive_utc(),
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_booking(&db, &booking)?;
    }

    tracing::info!(booking_id = %booking.id, user_id = %principal.id, "booking created");
    Ok(booking.id)
}

/// Open a gateway order for a booking. The amount is fixed here from the
/// stored total; the booking itself is not mutated, so retries are free.
pub async fn open_order(
    state: &AppState,
    principal: &Principal,
    booking_id: &str,
) -> Result<GatewayOrder, AppError> {
    let booking = load_booking(state, booking_id)?;
    auth::ensure_owner(principal, &booking.user_id)?;

    if booking.total <= 0.0 {
        return Err(AppError::InvalidInput(
            "invalid booking amount".to_string(),
        ));
    }
    if !state.gateway.is_configured() {
        return Err(AppError::GatewayUnavailable);
    }

    let amount_minor = to_minor_units(booking.total);
    let order = state
        .gateway
        .create_order(amount_minor, &state.config.currency, booking_id)
        .await
        .map_err(AppError::Gateway)?;

    tracing::info!(
        booking_id,
        order_id = %order.order_id,
        amount = order.amount,
        "gateway order opened"
    );
    Ok(order)
}

/// Verify a client-supplied payment callback and transition the booking to
/// paid. Replays are no-op successes; a bad signature changes nothing.
pub async fn confirm_payment(
    state: &AppState,
    principal: &Principal,
    booking_id: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> Result<(), AppError> {
    let booking = load_booking(state, booking_id)?;
    auth::ensure_owner(principal, &booking.user_id)?;

    if !state.gateway.is_configured() {
        return Err(AppError::GatewayUnavailable);
    }
    if !state.gateway.verify_signature(order_id, payment_id, signature) {
        tracing::warn!(booking_id, order_id, "payment signature rejected");
        return Err(AppError::InvalidSignature);
    }

    if booking.payment_status == PaymentStatus::Paid {
        return Ok(());
    }

    let transitioned = {
        let db = state.db.lock().unwrap();
        queries::mark_booking_paid(
            &db,
            booking_id,
            GATEWAY_PROVIDER,
            Some(payment_id),
            Some(order_id),
        )?
    };

    // A concurrent confirm may have won the guarded update; either way the
    // booking is paid now. Only the transitioning call sends the email.
    if transitioned {
        tracing::info!(booking_id, payment_id, "payment verified, booking paid");
        send_confirmation(state, booking_id).await;
    }

    Ok(())
}

/// Out-of-band confirmation for degraded or gateway-less operation. Tagged
/// with a distinct provider so reconciliation can tell the paths apart.
pub fn mark_paid_trusted(
    state: &AppState,
    principal: &Principal,
    booking_id: &str,
) -> Result<(), AppError> {
    let booking = load_booking(state, booking_id)?;
    auth::ensure_owner(principal, &booking.user_id)?;

    if booking.payment_status == PaymentStatus::Paid {
        return Ok(());
    }

    {
        let db = state.db.lock().unwrap();
        queries::mark_booking_paid(&db, booking_id, MANUAL_PROVIDER, None, None)?;
    }

    tracing::info!(booking_id, "booking marked paid (manual)");
    Ok(())
}

pub fn delete_booking(
    state: &AppState,
    principal: &Principal,
    booking_id: &str,
) -> Result<(), AppError> {
    let booking = load_booking(state, booking_id)?;
    auth::ensure_owner(principal, &booking.user_id)?;

    let db = state.db.lock().unwrap();
    if !queries::delete_booking(&db, booking_id)? {
        // Lost a race with another delete.
        return Err(AppError::NotFound("booking not found".to_string()));
    }
    Ok(())
}

async fn send_confirmation(state: &AppState, booking_id: &str) {
    let (booking, email) = {
        let db = state.db.lock().unwrap();
        let booking = match queries::get_booking(&db, booking_id) {
            Ok(Some(b)) => b,
            _ => return,
        };
        let email = queries::get_user(&db, &booking.user_id)
            .ok()
            .flatten()
            .map(|u| u.email)
            .unwrap_or_default();
        (booking, email)
    };

    if email.is_empty() {
        tracing::warn!(booking_id, "no email on file, skipping confirmation");
        return;
    }
    if let Err(e) = state
        .notifier
        .send_booking_confirmation(&email, &booking)
        .await
    {
        tracing::error!(error = %e, booking_id, "failed to send confirmation email");
    }
}
