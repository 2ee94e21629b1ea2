use sqlx::PgPool;
use tracing::info;

use crate::billing::ledger::{current_month_key, Account};
use crate::billing::tier::Tier;
use crate::models::user::UserRow;

/// Returns the user row, creating a Free account with a full allotment on first sight.
pub async fn get_or_create(
    pool: &PgPool,
    uid: &str,
    email: &str,
    display_name: Option<&str>,
) -> Result<UserRow, sqlx::Error> {
    if let Some(user) = find(pool, uid).await? {
        return Ok(user);
    }

    let account = Account::new(Tier::Free, &current_month_key());
    let inserted = sqlx::query(
        r#"
        INSERT INTO users (uid, email, display_name, tier, credits, max_credits, usage_month_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (uid) DO NOTHING
        "#,
    )
    .bind(uid)
    .bind(email)
    .bind(display_name)
    .bind(account.tier.as_str())
    .bind(account.credits)
    .bind(account.max_credits)
    .bind(&account.usage_month_key)
    .execute(pool)
    .await?;

    if inserted.rows_affected() == 1 {
        info!("Provisioned {} account for user {uid}", account.tier);
    }

    find(pool, uid).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn find(pool: &PgPool, uid: &str) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE uid = $1")
        .bind(uid)
        .fetch_optional(pool)
        .await
}
