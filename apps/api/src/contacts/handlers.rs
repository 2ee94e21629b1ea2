//! Axum route handlers for the Contacts API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::contacts::search::{run_search, SearchRequest, SearchResponse};
use crate::contacts::store::{self, ContactPatch, NewContact};
use crate::errors::AppError;
use crate::models::contact::{ContactRow, OutreachStatus};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<OutreachStatus>,
}

/// GET /api/v1/contacts
pub async fn handle_list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ContactRow>>, AppError> {
    Ok(Json(store::list(&state.db, &auth.uid, query.status).await?))
}

/// POST /api/v1/contacts
pub async fn handle_create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(contact): Json<NewContact>,
) -> Result<(StatusCode, Json<ContactRow>), AppError> {
    if contact.first_name.trim().is_empty() || contact.last_name.trim().is_empty() {
        return Err(AppError::Validation(
            "first_name and last_name are required".to_string(),
        ));
    }
    if let Some(email) = contact.email.as_deref() {
        if !email.trim().is_empty() && !email.contains('@') {
            return Err(AppError::Validation(format!("'{email}' is not an email address")));
        }
    }

    let row = store::insert(&state.db, &auth.uid, &contact, OutreachStatus::NotContacted).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/contacts/:id
pub async fn handle_get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ContactRow>, AppError> {
    Ok(Json(store::find(&state.db, &auth.uid, id).await?))
}

/// PATCH /api/v1/contacts/:id
pub async fn handle_update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<ContactPatch>,
) -> Result<Json<ContactRow>, AppError> {
    Ok(Json(store::update(&state.db, &auth.uid, id, &patch).await?))
}

/// DELETE /api/v1/contacts/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    store::delete(&state.db, &auth.uid, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/contacts/search
///
/// Finds new contacts, drafts outreach emails, saves them. Billed per requested contact.
pub async fn handle_search(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    Ok(Json(run_search(&state, &auth.uid, request).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_accepts_partial_body() {
        let patch: ContactPatch =
            serde_json::from_str(r#"{"status": "meeting_scheduled", "gmail_thread_id": "t-1"}"#)
                .unwrap();
        assert_eq!(patch.status, Some(OutreachStatus::MeetingScheduled));
        assert_eq!(patch.gmail_thread_id.as_deref(), Some("t-1"));
        assert!(patch.notes.is_none());
    }

    #[test]
    fn test_patch_rejects_unknown_status() {
        let result: Result<ContactPatch, _> = serde_json::from_str(r#"{"status": "ghosted"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_contact_defaults_optional_drafts() {
        let contact: NewContact = serde_json::from_str(
            r#"{"first_name": "Ana", "last_name": "Lee", "email": "ana@x.com",
                "company": null, "job_title": null, "location": null,
                "college": null, "linkedin_url": null}"#,
        )
        .unwrap();
        assert!(contact.email_subject.is_none());
        assert!(contact.notes.is_none());
    }
}
