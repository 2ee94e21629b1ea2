//! Postgres side of the credit gate.
//!
//! Every mutation loads the user row with `SELECT ... FOR UPDATE` inside a
//! transaction, so concurrent charges against one account serialize and the
//! ledger rules in `ledger` always see the latest balance.

use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};

use crate::billing::ledger::{current_month_key, Account, Charge};
use crate::billing::tier::{Feature, Tier};
use crate::errors::AppError;
use crate::models::user::{ActivityRow, UserRow};

async fn lock_user(
    tx: &mut Transaction<'_, Postgres>,
    uid: &str,
) -> Result<(UserRow, Account), AppError> {
    let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE uid = $1 FOR UPDATE")
        .bind(uid)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {uid} not found")))?;
    let account = row.account()?;
    Ok((row, account))
}

async fn write_account(
    tx: &mut Transaction<'_, Postgres>,
    uid: &str,
    account: &Account,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE users
        SET tier = $2, credits = $3, max_credits = $4,
            alumni_searches_used = $5, coffee_chat_preps_used = $6,
            interview_preps_used = $7, usage_month_key = $8, updated_at = now()
        WHERE uid = $1
        "#,
    )
    .bind(uid)
    .bind(account.tier.as_str())
    .bind(account.credits)
    .bind(account.max_credits)
    .bind(account.alumni_searches_used)
    .bind(account.coffee_chat_preps_used)
    .bind(account.interview_preps_used)
    .bind(&account.usage_month_key)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn log_activity(
    tx: &mut Transaction<'_, Postgres>,
    uid: &str,
    feature: &str,
    delta: i32,
    balance_after: i32,
    note: Option<&str>,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO activity_log (uid, feature, delta, balance_after, note) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(uid)
    .bind(feature)
    .bind(delta)
    .bind(balance_after)
    .bind(note)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Current account state, with the monthly roll applied and persisted if due.
pub async fn load_account(pool: &PgPool, uid: &str) -> Result<Account, AppError> {
    let mut tx = pool.begin().await?;
    let (_, mut account) = lock_user(&mut tx, uid).await?;
    if account.roll_month(&current_month_key()) {
        info!("Rolled usage period to {} for user {uid}", account.usage_month_key);
        write_account(&mut tx, uid, &account).await?;
    }
    tx.commit().await?;
    Ok(account)
}

/// Deducts `cost` credits for `feature`, or refuses without touching the balance.
pub async fn charge(
    pool: &PgPool,
    uid: &str,
    feature: Feature,
    cost: u32,
    note: Option<&str>,
) -> Result<Charge, AppError> {
    let mut tx = pool.begin().await?;
    let (_, mut account) = lock_user(&mut tx, uid).await?;
    let rolled = account.roll_month(&current_month_key());

    let charge = match account.authorize(feature, cost) {
        Ok(charge) => charge,
        Err(refusal) => {
            if rolled {
                write_account(&mut tx, uid, &account).await?;
                tx.commit().await?;
            }
            info!("Refused {feature} for user {uid}: {refusal}");
            return Err(refusal.into());
        }
    };

    account.apply_charge(&charge);
    write_account(&mut tx, uid, &account).await?;
    if charge.cost > 0 {
        log_activity(
            &mut tx,
            uid,
            feature.as_str(),
            -charge.cost,
            charge.balance_after,
            note,
        )
        .await?;
    }
    tx.commit().await?;

    info!(
        "Charged {} credits for {feature} to user {uid}, balance {}",
        charge.cost, charge.balance_after
    );
    Ok(charge)
}

/// Returns credits for work that was paid for but not delivered.
/// Returns the amount actually credited (refunds never exceed the ceiling).
pub async fn refund(
    pool: &PgPool,
    uid: &str,
    feature: Feature,
    amount: u32,
    note: Option<&str>,
) -> Result<i32, AppError> {
    if amount == 0 {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let (_, mut account) = lock_user(&mut tx, uid).await?;
    let credited = account.apply_refund(amount);
    if credited > 0 {
        write_account(&mut tx, uid, &account).await?;
        log_activity(
            &mut tx,
            uid,
            feature.as_str(),
            credited,
            account.credits,
            note,
        )
        .await?;
    }
    tx.commit().await?;

    info!("Refunded {credited} credits for {feature} to user {uid}");
    Ok(credited)
}

/// Best-effort refund used on failure and settlement paths. A refund error is
/// logged, not raised, and counts as nothing credited.
pub async fn refund_quietly(
    pool: &PgPool,
    uid: &str,
    feature: Feature,
    amount: u32,
    note: &str,
) -> i32 {
    match refund(pool, uid, feature, amount, Some(note)).await {
        Ok(credited) => credited,
        Err(e) => {
            warn!("Refund of {amount} credits for {feature} to user {uid} failed: {e}");
            0
        }
    }
}

pub async fn set_tier(pool: &PgPool, uid: &str, tier: Tier) -> Result<Account, AppError> {
    let mut tx = pool.begin().await?;
    let (_, mut account) = lock_user(&mut tx, uid).await?;
    account.roll_month(&current_month_key());
    let previous = account.tier;
    account.change_tier(tier);
    write_account(&mut tx, uid, &account).await?;
    log_activity(
        &mut tx,
        uid,
        "tier_change",
        0,
        account.credits,
        Some(&format!("{previous} -> {tier}")),
    )
    .await?;
    tx.commit().await?;

    info!("User {uid} moved from {previous} to {tier}");
    Ok(account)
}

pub async fn set_stripe_customer(pool: &PgPool, uid: &str, customer_id: &str) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET stripe_customer_id = $2, updated_at = now() WHERE uid = $1")
        .bind(uid)
        .bind(customer_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Applies a tier change addressed by Stripe customer id. Unknown customers are ignored.
pub async fn set_tier_by_customer(
    pool: &PgPool,
    customer_id: &str,
    tier: Tier,
) -> Result<Option<Account>, AppError> {
    let uid: Option<String> =
        sqlx::query_scalar("SELECT uid FROM users WHERE stripe_customer_id = $1")
            .bind(customer_id)
            .fetch_optional(pool)
            .await?;

    match uid {
        Some(uid) => Ok(Some(set_tier(pool, &uid, tier).await?)),
        None => {
            warn!("No user for Stripe customer {customer_id}");
            Ok(None)
        }
    }
}

pub async fn recent_activity(pool: &PgPool, uid: &str, limit: i64) -> Result<Vec<ActivityRow>, AppError> {
    Ok(sqlx::query_as::<_, ActivityRow>(
        "SELECT * FROM activity_log WHERE uid = $1 ORDER BY created_at DESC, id DESC LIMIT $2",
    )
    .bind(uid)
    .bind(limit)
    .fetch_all(pool)
    .await?)
}
