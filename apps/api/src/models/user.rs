use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::billing::ledger::Account;
use crate::billing::tier::Tier;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub tier: String,
    pub credits: i32,
    pub max_credits: i32,
    pub alumni_searches_used: i32,
    pub coffee_chat_preps_used: i32,
    pub interview_preps_used: i32,
    pub usage_month_key: String,
    pub stripe_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub fn tier(&self) -> anyhow::Result<Tier> {
        self.tier
            .parse::<Tier>()
            .map_err(|e| anyhow!("user {} has corrupt tier: {e}", self.uid))
    }

    pub fn account(&self) -> anyhow::Result<Account> {
        Ok(Account {
            tier: self.tier()?,
            credits: self.credits,
            max_credits: self.max_credits,
            alumni_searches_used: self.alumni_searches_used,
            coffee_chat_preps_used: self.coffee_chat_preps_used,
            interview_preps_used: self.interview_preps_used,
            usage_month_key: self.usage_month_key.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityRow {
    pub id: i64,
    pub uid: String,
    pub feature: String,
    pub delta: i32,
    pub balance_after: i32,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}
