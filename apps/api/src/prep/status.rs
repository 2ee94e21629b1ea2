//! Prep status cache.
//!
//! The polling endpoint reads `prep_status:{id}` from Redis and falls back to
//! Postgres on a miss. Postgres stays authoritative; cache writes are best-effort.
//! Only terminal statuses are served from the cache, so a stale `processing`
//! entry can never hide a finished prep.

use redis::RedisResult;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::models::prep::{PrepRow, PrepStatus};
use crate::state::AppState;

const STATUS_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepStatusView {
    pub prep_id: Uuid,
    /// Owner, checked before a cached entry is served.
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub uid: String,
    pub status: PrepStatus,
    pub error: Option<String>,
}

impl PrepStatusView {
    pub fn from_row(row: &PrepRow) -> Result<Self, String> {
        Ok(Self {
            prep_id: row.id,
            uid: row.uid.clone(),
            status: row.status.parse()?,
            error: row.error_message.clone(),
        })
    }

    /// Response shape for the client; the owner is not echoed back.
    pub fn public(mut self) -> Self {
        self.uid.clear();
        self
    }
}

pub fn cache_key(prep_id: Uuid) -> String {
    format!("prep_status:{prep_id}")
}

pub async fn publish(state: &AppState, view: &PrepStatusView) {
    let payload = match serde_json::to_string(view) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Could not encode status for prep {}: {e}", view.prep_id);
            return;
        }
    };

    if let Err(e) = write_cached(&state.redis, view.prep_id, payload).await {
        warn!("Could not cache status for prep {}: {e}", view.prep_id);
    }
}

async fn write_cached(client: &redis::Client, prep_id: Uuid, payload: String) -> RedisResult<()> {
    let mut conn = client.get_multiplexed_async_connection().await?;
    redis::cmd("SET")
        .arg(cache_key(prep_id))
        .arg(payload)
        .arg("EX")
        .arg(STATUS_TTL_SECS)
        .query_async(&mut conn)
        .await
}

async fn read_cached(client: &redis::Client, prep_id: Uuid) -> RedisResult<Option<String>> {
    let mut conn = client.get_multiplexed_async_connection().await?;
    redis::cmd("GET")
        .arg(cache_key(prep_id))
        .query_async(&mut conn)
        .await
}

/// Decodes a cached entry and keeps it only if it is terminal and owned by `uid`.
fn accept_cached(payload: &str, uid: &str) -> Result<Option<PrepStatusView>, serde_json::Error> {
    let view: PrepStatusView = serde_json::from_str(payload)?;
    Ok((view.uid == uid && view.status.is_terminal()).then_some(view))
}

/// Cached terminal status for `prep_id`, or `None` on a miss, a cache error,
/// an owner mismatch, or a non-terminal entry.
pub async fn lookup(state: &AppState, uid: &str, prep_id: Uuid) -> Option<PrepStatusView> {
    let payload = match read_cached(&state.redis, prep_id).await {
        Ok(payload) => payload?,
        Err(e) => {
            warn!("Status cache unavailable for prep {prep_id}: {e}");
            return None;
        }
    };

    match accept_cached(&payload, uid) {
        Ok(view) => view,
        Err(e) => {
            warn!("Discarding unreadable cached status for prep {prep_id}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn row(status: &str, error: Option<&str>) -> PrepRow {
        PrepRow {
            id: Uuid::nil(),
            uid: "uid_1".to_string(),
            kind: "interview".to_string(),
            status: status.to_string(),
            input: json!({}),
            result: None,
            s3_key: None,
            error_message: error.map(str::to_string),
            credits_charged: 25,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_cache_key_format() {
        assert_eq!(
            cache_key(Uuid::nil()),
            "prep_status:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_view_from_row_and_public_shape() {
        let view = PrepStatusView::from_row(&row("failed", Some("LLM timed out"))).unwrap();
        assert_eq!(view.status, PrepStatus::Failed);
        assert_eq!(view.uid, "uid_1");

        let cached: PrepStatusView =
            serde_json::from_str(&serde_json::to_string(&view).unwrap()).unwrap();
        assert_eq!(cached.uid, "uid_1");

        let body = serde_json::to_value(view.public()).unwrap();
        assert!(body.get("uid").is_none());
        assert_eq!(body["status"], "failed");
        assert_eq!(body["error"], "LLM timed out");
    }

    #[test]
    fn test_cached_processing_is_not_served() {
        let processing = serde_json::to_string(&PrepStatusView {
            prep_id: Uuid::nil(),
            uid: "uid_1".to_string(),
            status: PrepStatus::Processing,
            error: None,
        })
        .unwrap();
        assert_eq!(accept_cached(&processing, "uid_1").unwrap(), None);

        let completed = processing.replace("processing", "completed");
        let view = accept_cached(&completed, "uid_1").unwrap().unwrap();
        assert_eq!(view.status, PrepStatus::Completed);
    }

    #[test]
    fn test_cached_entry_for_other_owner_is_not_served() {
        let failed = serde_json::to_string(&PrepStatusView {
            prep_id: Uuid::nil(),
            uid: "uid_1".to_string(),
            status: PrepStatus::Failed,
            error: Some("Upstream model error".to_string()),
        })
        .unwrap();
        assert_eq!(accept_cached(&failed, "uid_2").unwrap(), None);
        assert!(accept_cached("not json", "uid_1").is_err());
    }

    #[test]
    fn test_unknown_status_in_row_is_an_error() {
        assert!(PrepStatusView::from_row(&row("queued", None)).is_err());
    }
}
