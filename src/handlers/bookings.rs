use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::services::booking_flow::{self, BookingDraft};
use crate::state::AppState;

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(draft): Json<BookingDraft>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let principal = auth::authenticate(&state, &headers).await?;
    let booking_id = booking_flow::create_booking(&state, &principal, draft)?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Booking created successfully",
            "bookingId": booking_id,
        })),
    ))
}

// GET /api/bookings
pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let principal = auth::authenticate(&state, &headers).await?;

    let bookings = {
        let db = state.db.lock().unwrap();
        queries::get_bookings_for_user(&db, &principal.id)?
    };

    Ok(Json(serde_json::json!({ "bookings": bookings })))
}

// GET /api/bookings/:user_id
pub async fn user_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let principal = auth::authenticate(&state, &headers).await?;
    auth::ensure_owner(&principal, &user_id)?;

    let bookings = {
        let db = state.db.lock().unwrap();
        queries::get_bookings_for_user(&db, &user_id)?
    };

    Ok(Json(serde_json::json!({ "bookings": bookings })))
}

// DELETE /api/bookings/:booking_id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let principal = auth::authenticate(&state, &headers).await?;
    booking_flow::delete_booking(&state, &principal, &booking_id)?;

    Ok(Json(serde_json::json!({ "message": "Booking deleted successfully" })))
}

// POST /api/bookings/:booking_id/mark-paid
pub async fn mark_paid(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let principal = auth::authenticate(&state, &headers).await?;
    booking_flow::mark_paid_trusted(&state, &principal, &booking_id)?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Booking marked as paid",
    })))
}
