use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::User;
use crate::state::AppState;

// GET /api/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let principal = auth::authenticate(&state, &headers).await?;

    let name = {
        let db = state.db.lock().unwrap();
        queries::get_user(&db, &principal.id)?
            .map(|u| u.name)
            .unwrap_or_default()
    };

    Ok(Json(serde_json::json!({
        "uid": principal.id,
        "email": principal.email,
        "name": name,
        "isAdmin": principal.is_admin,
    })))
}

// POST /api/users/sync
#[derive(Deserialize)]
pub struct SyncRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

pub async fn sync_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Option<Json<SyncRequest>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let principal = auth::authenticate(&state, &headers).await?;
    let body = body.map(|Json(b)| b).unwrap_or(SyncRequest {
        name: None,
        phone: None,
        email: None,
    });

    let now = Utc::now().naive_utc();
    let existing = {
        let db = state.db.lock().unwrap();
        queries::get_user(&db, &principal.id)?
    };
    let is_new = existing.is_none();

    let mut user = existing.unwrap_or(User {
        id: principal.id.clone(),
        email: principal.email.clone(),
        name: String::new(),
        phone: String::new(),
        created_at: now,
        updated_at: now,
    });

    if let Some(email) = body.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        user.email = email.to_string();
    }
    if let Some(name) = body.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        user.name = name.to_string();
    } else if is_new && user.name.is_empty() {
        // First sync without a name: default to the email local part.
        user.name = user.email.split('@').next().unwrap_or("").to_string();
    }
    if let Some(phone) = body.phone {
        user.phone = phone;
    }
    user.updated_at = now;

    {
        let db = state.db.lock().unwrap();
        queries::save_user(&db, &user)?;
    }

    if is_new && !user.email.is_empty() {
        if let Err(e) = state.notifier.send_welcome(&user.email, &user.name).await {
            tracing::error!(error = %e, uid = %user.id, "failed to send welcome email");
        }
    }

    Ok(Json(serde_json::json!({
        "message": "User synced successfully",
        "uid": principal.id,
    })))
}

// GET /api/users/:uid
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(uid): Path<String>,
) -> Result<Json<User>, AppError> {
    let principal = auth::authenticate(&state, &headers).await?;
    auth::ensure_owner(&principal, &uid)?;

    let user = {
        let db = state.db.lock().unwrap();
        queries::get_user(&db, &uid)?
    }
    .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

    Ok(Json(user))
}

// PUT /api/users/:uid
#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(uid): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let principal = auth::authenticate(&state, &headers).await?;
    auth::ensure_owner(&principal, &uid)?;

    let db = state.db.lock().unwrap();
    let mut user = queries::get_user(&db, &uid)?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

    if let Some(name) = body.name.filter(|n| !n.is_empty()) {
        user.name = name;
    }
    if let Some(phone) = body.phone {
        user.phone = phone;
    }
    user.updated_at = Utc::now().naive_utc();
    queries::save_user(&db, &user)?;

    Ok(Json(serde_json::json!({ "message": "Profile updated successfully" })))
}
