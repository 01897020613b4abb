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
use crate::models::TripPhoto;
use crate::state::AppState;

// POST /api/photos
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePhotoRequest {
    pub photo_url: Option<String>,
    pub description: Option<String>,
}

pub async fn save_photo(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SavePhotoRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let principal = auth::authenticate(&state, &headers).await?;

    let photo_url = body
        .photo_url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::InvalidInput("photo URL is required".to_string()))?;

    let photo = TripPhoto {
        id: Uuid::new_v4().to_string(),
        user_id: principal.id.clone(),
        photo_url,
        description: body.description.unwrap_or_default(),
        created_at: Utc::now().naive_utc(),
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_photo(&db, &photo)?;
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Photo saved successfully",
            "photoId": photo.id,
        })),
    ))
}

// GET /api/photos/:user_id
pub async fn user_photos(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let principal = auth::authenticate(&state, &headers).await?;
    auth::ensure_owner(&principal, &user_id)?;

    let photos = {
        let db = state.db.lock().unwrap();
        queries::get_photos_for_user(&db, &user_id)?
    };

    Ok(Json(serde_json::json!({ "photos": photos })))
}

// DELETE /api/photos/:photo_id
pub async fn delete_photo(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(photo_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let principal = auth::authenticate(&state, &headers).await?;

    let db = state.db.lock().unwrap();
    let photo = queries::get_photo(&db, &photo_id)?
        .ok_or_else(|| AppError::NotFound("photo not found".to_string()))?;
    auth::ensure_owner(&principal, &photo.user_id)?;
    queries::delete_photo(&db, &photo_id)?;

    Ok(Json(serde_json::json!({ "message": "Photo deleted successfully" })))
}
