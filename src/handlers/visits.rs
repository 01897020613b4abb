use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{NaiveDateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::Visit;
use crate::state::AppState;

fn parse_start(raw: &str) -> Option<NaiveDateTime> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_utc())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok())
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M").ok())
}

// POST /api/visits
#[derive(Deserialize)]
pub struct CreateVisitRequest {
    pub place: Option<String>,
    pub start: Option<String>,
    pub duration: Option<i64>,
}

pub async fn create_visit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateVisitRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let principal = auth::authenticate(&state, &headers).await?;

    let place = body.place.as_deref().unwrap_or("").trim().to_string();
    let start_raw = body.start.as_deref().unwrap_or("");
    if place.is_empty() || start_raw.is_empty() {
        return Err(AppError::InvalidInput(
            "place and start time are required".to_string(),
        ));
    }
    let start = parse_start(start_raw)
        .ok_or_else(|| AppError::InvalidInput("invalid start time".to_string()))?;

    let visit = Visit {
        id: Uuid::new_v4().to_string(),
        user_id: principal.id.clone(),
        place,
        start,
        duration_minutes: body.duration.unwrap_or(60).max(1),
        created_at: Utc::now().naive_utc(),
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_visit(&db, &visit)?;
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Visit created successfully",
            "visitId": visit.id,
        })),
    ))
}

// GET /api/visits/:user_id
pub async fn user_visits(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let principal = auth::authenticate(&state, &headers).await?;
    auth::ensure_owner(&principal, &user_id)?;

    let visits = {
        let db = state.db.lock().unwrap();
        queries::get_visits_for_user(&db, &user_id)?
    };

    Ok(Json(serde_json::json!({ "visits": visits })))
}
