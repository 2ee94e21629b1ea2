use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Where a contact sits in the user's outreach pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutreachStatus {
    NotContacted,
    Drafted,
    Sent,
    Replied,
    MeetingScheduled,
    Closed,
}

impl OutreachStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OutreachStatus::NotContacted => "not_contacted",
            OutreachStatus::Drafted => "drafted",
            OutreachStatus::Sent => "sent",
            OutreachStatus::Replied => "replied",
            OutreachStatus::MeetingScheduled => "meeting_scheduled",
            OutreachStatus::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContactRow {
    pub id: Uuid,
    pub uid: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub location: Option<String>,
    pub college: Option<String>,
    pub linkedin_url: Option<String>,
    pub status: String,
    pub email_subject: Option<String>,
    pub email_body: Option<String>,
    pub gmail_thread_id: Option<String>,
    pub gmail_draft_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
