use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use crate::auth;
use crate::errors::AppError;
use crate::services::overview::{self, Overview};
use crate::state::AppState;

// GET /api/admin/overview
pub async fn admin_overview(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Overview>, AppError> {
    let principal = auth::authenticate(&state, &headers).await?;
    let overview = overview::overview(&state, &principal)?;
    Ok(Json(overview))
}
