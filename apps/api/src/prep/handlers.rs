//! Axum route handlers for coffee chat and interview prep.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::billing::store as billing;
use crate::errors::AppError;
use crate::models::prep::{PrepKind, PrepRow, PrepStatus};
use crate::prep::jobs::{run_prep, CoffeeChatInput, InterviewInput, PrepInput};
use crate::prep::status::{self, PrepStatusView};
use crate::prep::store;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PrepStarted {
    pub prep_id: Uuid,
    pub status: PrepStatus,
    pub credits_remaining: i32,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub kind: Option<PrepKind>,
}

/// Charges, records a `processing` row and hands the work to a background task.
async fn start_prep(
    state: AppState,
    uid: String,
    input: PrepInput,
) -> Result<(StatusCode, Json<PrepStarted>), AppError> {
    input.validate()?;
    let payload = input.to_json()?;
    let feature = input.kind().feature();
    let cost = feature.unit_cost().unsigned_abs();

    let charge = billing::charge(&state.db, &uid, feature, cost, None).await?;

    let row = match store::insert_processing(&state.db, &uid, input.kind(), &payload, charge.cost)
        .await
    {
        Ok(row) => row,
        Err(e) => {
            billing::refund_quietly(&state.db, &uid, feature, cost, "prep not started").await;
            return Err(e);
        }
    };

    info!("Queued prep {} for user {uid}", row.id);
    tokio::spawn(run_prep(state, uid, row.id, input, cost));

    Ok((
        StatusCode::ACCEPTED,
        Json(PrepStarted {
            prep_id: row.id,
            status: PrepStatus::Processing,
            credits_remaining: charge.balance_after,
        }),
    ))
}

/// POST /api/v1/coffee-chat-prep
pub async fn handle_start_coffee_chat(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CoffeeChatInput>,
) -> Result<(StatusCode, Json<PrepStarted>), AppError> {
    start_prep(state, auth.uid, PrepInput::CoffeeChat(input)).await
}

/// POST /api/v1/interview-prep
pub async fn handle_start_interview(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<InterviewInput>,
) -> Result<(StatusCode, Json<PrepStarted>), AppError> {
    start_prep(state, auth.uid, PrepInput::Interview(input)).await
}

/// GET /api/v1/preps/:id/status
///
/// Polled by the client every few seconds while a prep is processing.
pub async fn handle_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PrepStatusView>, AppError> {
    if let Some(view) = status::lookup(&state, &auth.uid, id).await {
        return Ok(Json(view.public()));
    }

    let row = store::find(&state.db, &auth.uid, id).await?;
    let view = PrepStatusView::from_row(&row)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Prep {id}: {e}")))?;
    if view.status.is_terminal() {
        status::publish(&state, &view).await;
    }
    Ok(Json(view.public()))
}

/// GET /api/v1/preps/:id
pub async fn handle_get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PrepRow>, AppError> {
    Ok(Json(store::find(&state.db, &auth.uid, id).await?))
}

/// GET /api/v1/preps
pub async fn handle_list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PrepRow>>, AppError> {
    Ok(Json(store::list(&state.db, &auth.uid, query.kind).await?))
}
