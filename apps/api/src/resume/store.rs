use serde_json::Value;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeRow;
use crate::resume::parser::ParsedResume;

/// Parameters for replacing a user's current resume.
pub struct StoreResume<'a> {
    pub uid: &'a str,
    pub file_name: &'a str,
    pub s3_key: &'a str,
    pub raw_text: &'a str,
    pub parsed: &'a Value,
}

/// Replaces the user's current resume (one row per user).
pub async fn upsert(pool: &PgPool, params: StoreResume<'_>) -> Result<ResumeRow, AppError> {
    Ok(sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes (id, uid, file_name, s3_key, raw_text, parsed)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (uid) DO UPDATE SET
            id = EXCLUDED.id,
            file_name = EXCLUDED.file_name,
            s3_key = EXCLUDED.s3_key,
            raw_text = EXCLUDED.raw_text,
            parsed = EXCLUDED.parsed,
            created_at = now()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(params.uid)
    .bind(params.file_name)
    .bind(params.s3_key)
    .bind(params.raw_text)
    .bind(params.parsed)
    .fetch_one(pool)
    .await?)
}

pub async fn find(pool: &PgPool, uid: &str) -> Result<Option<ResumeRow>, AppError> {
    Ok(
        sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE uid = $1")
            .bind(uid)
            .fetch_optional(pool)
            .await?,
    )
}

/// The structured resume, if one was uploaded and its stored JSON still parses.
pub async fn find_parsed(pool: &PgPool, uid: &str) -> Result<Option<ParsedResume>, AppError> {
    let Some(row) = find(pool, uid).await? else {
        return Ok(None);
    };
    match serde_json::from_value::<ParsedResume>(row.parsed) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            warn!("Stored resume {} for user {uid} does not parse: {e}", row.id);
            Ok(None)
        }
    }
}
