use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::directory::store::{self, clamp_limit, DirectoryEntry};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DirectoryQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<u32>,
}

/// GET /api/v1/directory
pub async fn handle_search(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<DirectoryQuery>,
) -> Result<Json<Vec<DirectoryEntry>>, AppError> {
    let pool = state
        .directory
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("Directory is not configured".to_string()))?;
    Ok(Json(store::search(pool, &query.q, clamp_limit(query.limit)).await?))
}
