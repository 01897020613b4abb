use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::Journey;
use crate::state::AppState;

// POST /api/journeys
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJourneyRequest {
    pub place: Option<String>,
    pub arrive: Option<String>,
    pub hotel: Option<String>,
    pub nights: Option<i64>,
    pub price: Option<f64>,
    pub travel_mode: Option<String>,
    pub notes: Option<String>,
}

pub async fn create_journey(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateJourneyRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let principal = auth::authenticate(&state, &headers).await?;

    let place = body.place.as_deref().unwrap_or("").trim().to_string();
    if place.is_empty() {
        return Err(AppError::InvalidInput("place is required".to_string()));
    }

    let journey = Journey {
        id: Uuid::new_v4().to_string(),
        user_id: principal.id.clone(),
        place,
        arrive: body.arrive.unwrap_or_default(),
        hotel: body.hotel.unwrap_or_default(),
        nights: body.nights.unwrap_or(1).max(1),
        price: body.price.unwrap_or(0.0).max(0.0),
        travel_mode: body.travel_mode.unwrap_or_else(|| "Train".to_string()),
        notes: body.notes.unwrap_or_default(),
        created_at: Utc::now().naive_utc(),
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_journey(&db, &journey)?;
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Journey created successfully",
            "journeyId": journey.id,
        })),
    ))
}

// GET /api/journeys
pub async fn my_journeys(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let principal = auth::authenticate(&state, &headers).await?;

    let journeys = {
        let db = state.db.lock().unwrap();
        queries::get_journeys_for_user(&db, &principal.id)?
    };

    Ok(Json(serde_json::json!({ "journeys": journeys })))
}

// GET /api/journeys/:user_id
pub async fn user_journeys(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let principal = auth::authenticate(&state, &headers).await?;
    auth::ensure_owner(&principal, &user_id)?;

    let journeys = {
        let db = state.db.lock().unwrap();
        queries::get_journeys_for_user(&db, &user_id)?
    };

    Ok(Json(serde_json::json!({ "journeys": journeys })))
}

// DELETE /api/journeys/:journey_id
pub async fn delete_journey(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(journey_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let principal = auth::authenticate(&state, &headers).await?;

    let db = state.db.lock().unwrap();
    let journey = queries::get_journey(&db, &journey_id)?
        .ok_or_else(|| AppError::NotFound("journey not found".to_string()))?;
    auth::ensure_owner(&principal, &journey.user_id)?;
    queries::delete_journey(&db, &journey_id)?;

    Ok(Json(serde_json::json!({ "message": "Journey deleted successfully" })))
}
