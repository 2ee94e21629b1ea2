use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::billing::tier::Feature;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrepKind {
    CoffeeChat,
    Interview,
}

impl PrepKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PrepKind::CoffeeChat => "coffee_chat",
            PrepKind::Interview => "interview",
        }
    }

    pub fn feature(self) -> Feature {
        match self {
            PrepKind::CoffeeChat => Feature::CoffeeChatPrep,
            PrepKind::Interview => Feature::InterviewPrep,
        }
    }
}

/// Lifecycle of a prep job: `processing` until the background task settles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrepStatus {
    Processing,
    Completed,
    Failed,
}

impl PrepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PrepStatus::Processing => "processing",
            PrepStatus::Completed => "completed",
            PrepStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, PrepStatus::Processing)
    }
}

impl FromStr for PrepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(PrepStatus::Processing),
            "completed" => Ok(PrepStatus::Completed),
            "failed" => Ok(PrepStatus::Failed),
            other => Err(format!("unknown prep status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PrepRow {
    pub id: Uuid,
    pub uid: String,
    pub kind: String,
    pub status: String,
    pub input: Value,
    pub result: Option<Value>,
    pub s3_key: Option<String>,
    pub error_message: Option<String>,
    pub credits_charged: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
