//! Axum route handlers for the Resume and Application Lab APIs.

use aws_sdk_s3::primitives::ByteStream;
use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::resume::ResumeRow;
use crate::resume::application_lab::{
    run_application_lab, ApplicationLabRequest, ApplicationLabResponse,
};
use crate::resume::parser::{extract_pdf_text, parse_resume};
use crate::resume::store::{self, StoreResume};
use crate::state::AppState;

/// Upload size accepted on the resume route.
pub const MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;

/// POST /api/v1/resume
///
/// Multipart upload with a `file` part holding a PDF. Replaces the current resume.
pub async fn handle_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ResumeRow>, AppError> {
    let mut upload: Option<(String, bytes::Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
        let is_pdf = field.content_type() == Some("application/pdf")
            || file_name.to_lowercase().ends_with(".pdf");
        if !is_pdf {
            return Err(AppError::Validation("Resume must be a PDF".to_string()));
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
        upload = Some((file_name, data));
        break;
    }

    let (file_name, data) =
        upload.ok_or_else(|| AppError::Validation("Missing 'file' part".to_string()))?;

    let raw_text = extract_pdf_text(data.clone()).await?;
    let parsed = parse_resume(&raw_text, &state.llm).await?;

    let s3_key = format!("resumes/{}/{}.pdf", auth.uid, Uuid::new_v4());
    state
        .s3
        .put_object()
        .bucket(&state.config.s3_bucket)
        .key(&s3_key)
        .body(ByteStream::from(data))
        .content_type("application/pdf")
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Resume upload failed: {e}")))?;

    let parsed_value = serde_json::to_value(&parsed)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize resume: {e}")))?;

    let row = store::upsert(
        &state.db,
        StoreResume {
            uid: &auth.uid,
            file_name: &file_name,
            s3_key: &s3_key,
            raw_text: &raw_text,
            parsed: &parsed_value,
        },
    )
    .await?;

    info!("Stored resume {} for user {}", row.id, auth.uid);
    Ok(Json(row))
}

/// GET /api/v1/resume
pub async fn handle_get(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ResumeRow>, AppError> {
    store::find(&state.db, &auth.uid)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No resume uploaded yet".to_string()))
}

/// POST /api/v1/application-lab
pub async fn handle_application_lab(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<ApplicationLabRequest>,
) -> Result<Json<ApplicationLabResponse>, AppError> {
    Ok(Json(run_application_lab(&state, &auth.uid, request).await?))
}
