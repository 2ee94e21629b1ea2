use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// The user's current resume. One row per user; a new upload replaces it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub uid: String,
    pub file_name: String,
    pub s3_key: String,
    pub raw_text: String,
    pub parsed: Value,
    pub created_at: DateTime<Utc>,
}
