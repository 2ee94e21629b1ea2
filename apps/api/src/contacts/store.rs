use std::collections::HashSet;

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::contacts::dedup::normalize_email;
use crate::errors::AppError;
use crate::models::contact::{ContactRow, OutreachStatus};

/// Fields for a new contact row.
#[derive(Debug, Clone, Deserialize)]
pub struct NewContact {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub location: Option<String>,
    pub college: Option<String>,
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub email_subject: Option<String>,
    #[serde(default)]
    pub email_body: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update; `None` leaves a column unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactPatch {
    pub status: Option<OutreachStatus>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub email_subject: Option<String>,
    pub email_body: Option<String>,
    pub gmail_thread_id: Option<String>,
    pub gmail_draft_id: Option<String>,
    pub notes: Option<String>,
}

pub async fn list(
    pool: &PgPool,
    uid: &str,
    status: Option<OutreachStatus>,
) -> Result<Vec<ContactRow>, AppError> {
    Ok(sqlx::query_as::<_, ContactRow>(
        r#"
        SELECT * FROM contacts
        WHERE uid = $1 AND ($2::text IS NULL OR status = $2)
        ORDER BY created_at DESC
        "#,
    )
    .bind(uid)
    .bind(status.map(OutreachStatus::as_str))
    .fetch_all(pool)
    .await?)
}

pub async fn find(pool: &PgPool, uid: &str, id: Uuid) -> Result<ContactRow, AppError> {
    sqlx::query_as::<_, ContactRow>("SELECT * FROM contacts WHERE id = $1 AND uid = $2")
        .bind(id)
        .bind(uid)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Contact {id} not found")))
}

/// Lower-cased emails of every saved contact, for write-time dedup.
pub async fn existing_emails(pool: &PgPool, uid: &str) -> Result<HashSet<String>, AppError> {
    let emails: Vec<String> = sqlx::query_scalar(
        "SELECT lower(email) FROM contacts WHERE uid = $1 AND email IS NOT NULL",
    )
    .bind(uid)
    .fetch_all(pool)
    .await?;
    Ok(emails.into_iter().collect())
}

/// Inserts a contact, refusing a second contact with the same email.
pub async fn insert(
    pool: &PgPool,
    uid: &str,
    contact: &NewContact,
    status: OutreachStatus,
) -> Result<ContactRow, AppError> {
    let email = contact
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|e| !e.is_empty());

    if let Some(email) = &email {
        let duplicate: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM contacts WHERE uid = $1 AND lower(email) = $2 LIMIT 1",
        )
        .bind(uid)
        .bind(email)
        .fetch_optional(pool)
        .await?;
        if let Some(existing) = duplicate {
            return Err(AppError::Conflict(format!(
                "A contact with email {email} already exists ({existing})"
            )));
        }
    }

    Ok(sqlx::query_as::<_, ContactRow>(
        r#"
        INSERT INTO contacts
            (id, uid, first_name, last_name, email, company, job_title, location,
             college, linkedin_url, status, email_subject, email_body, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(uid)
    .bind(contact.first_name.trim())
    .bind(contact.last_name.trim())
    .bind(email)
    .bind(&contact.company)
    .bind(&contact.job_title)
    .bind(&contact.location)
    .bind(&contact.college)
    .bind(&contact.linkedin_url)
    .bind(status.as_str())
    .bind(&contact.email_subject)
    .bind(&contact.email_body)
    .bind(&contact.notes)
    .fetch_one(pool)
    .await?)
}

pub async fn update(
    pool: &PgPool,
    uid: &str,
    id: Uuid,
    patch: &ContactPatch,
) -> Result<ContactRow, AppError> {
    sqlx::query_as::<_, ContactRow>(
        r#"
        UPDATE contacts SET
            status = COALESCE($3, status),
            company = COALESCE($4, company),
            job_title = COALESCE($5, job_title),
            email_subject = COALESCE($6, email_subject),
            email_body = COALESCE($7, email_body),
            gmail_thread_id = COALESCE($8, gmail_thread_id),
            gmail_draft_id = COALESCE($9, gmail_draft_id),
            notes = COALESCE($10, notes),
            updated_at = now()
        WHERE id = $1 AND uid = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(uid)
    .bind(patch.status.map(OutreachStatus::as_str))
    .bind(&patch.company)
    .bind(&patch.job_title)
    .bind(&patch.email_subject)
    .bind(&patch.email_body)
    .bind(&patch.gmail_thread_id)
    .bind(&patch.gmail_draft_id)
    .bind(&patch.notes)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Contact {id} not found")))
}

pub async fn delete(pool: &PgPool, uid: &str, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM contacts WHERE id = $1 AND uid = $2")
        .bind(id)
        .bind(uid)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Contact {id} not found")));
    }
    Ok(())
}
