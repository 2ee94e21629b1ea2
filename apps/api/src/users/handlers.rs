use axum::{extract::State, Json};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::billing::handlers::CreditSummary;
use crate::billing::store::load_account;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub has_stripe_customer: bool,
    pub credits: CreditSummary,
}

/// GET /api/v1/me
pub async fn handle_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MeResponse>, AppError> {
    let account = load_account(&state.db, &auth.uid).await?;
    Ok(Json(MeResponse {
        uid: auth.uid,
        email: auth.email,
        display_name: auth.user.display_name,
        has_stripe_customer: auth.user.stripe_customer_id.is_some(),
        credits: CreditSummary::from(&account),
    }))
}
