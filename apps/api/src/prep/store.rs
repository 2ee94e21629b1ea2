use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::prep::{PrepKind, PrepRow, PrepStatus};

pub async fn insert_processing(
    pool: &PgPool,
    uid: &str,
    kind: PrepKind,
    input: &Value,
    credits_charged: i32,
) -> Result<PrepRow, AppError> {
    Ok(sqlx::query_as::<_, PrepRow>(
        r#"
        INSERT INTO preps (id, uid, kind, status, input, credits_charged)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(uid)
    .bind(kind.as_str())
    .bind(PrepStatus::Processing.as_str())
    .bind(input)
    .bind(credits_charged)
    .fetch_one(pool)
    .await?)
}

pub async fn mark_completed(
    pool: &PgPool,
    id: Uuid,
    result: &Value,
    s3_key: &str,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE preps SET status = $2, result = $3, s3_key = $4, updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(PrepStatus::Completed.as_str())
    .bind(result)
    .bind(s3_key)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn mark_failed(pool: &PgPool, id: Uuid, message: &str) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE preps SET status = $2, error_message = $3, updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(PrepStatus::Failed.as_str())
    .bind(message)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find(pool: &PgPool, uid: &str, id: Uuid) -> Result<PrepRow, AppError> {
    sqlx::query_as::<_, PrepRow>("SELECT * FROM preps WHERE id = $1 AND uid = $2")
        .bind(id)
        .bind(uid)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Prep {id} not found")))
}

pub async fn list(
    pool: &PgPool,
    uid: &str,
    kind: Option<PrepKind>,
) -> Result<Vec<PrepRow>, AppError> {
    Ok(sqlx::query_as::<_, PrepRow>(
        r#"
        SELECT * FROM preps
        WHERE uid = $1 AND ($2::text IS NULL OR kind = $2)
        ORDER BY created_at DESC
        "#,
    )
    .bind(uid)
    .bind(kind.map(PrepKind::as_str))
    .fetch_all(pool)
    .await?)
}
