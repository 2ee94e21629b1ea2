//! Axum route handlers for the Calendar API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::calendar::store::{self, month_range, EventPatch, NewEvent};
use crate::errors::AppError;
use crate::models::calendar::CalendarEventRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// `YYYY-MM`
    pub month: Option<String>,
}

/// GET /api/v1/calendar/events
pub async fn handle_list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<CalendarEventRow>>, AppError> {
    let range = query.month.as_deref().map(month_range).transpose()?;
    Ok(Json(store::list(&state.db, &auth.uid, range).await?))
}

/// POST /api/v1/calendar/events
pub async fn handle_create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(event): Json<NewEvent>,
) -> Result<(StatusCode, Json<CalendarEventRow>), AppError> {
    event.validate()?;
    let row = store::insert(&state.db, &auth.uid, &event).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PATCH /api/v1/calendar/events/:id
pub async fn handle_update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<EventPatch>,
) -> Result<Json<CalendarEventRow>, AppError> {
    patch.validate()?;
    Ok(Json(store::update(&state.db, &auth.uid, id, &patch).await?))
}

/// DELETE /api/v1/calendar/events/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    store::delete(&state.db, &auth.uid, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
