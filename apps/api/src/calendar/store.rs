use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::calendar::{CalendarEventRow, EventStatus, EventType};

const DEFAULT_DURATION_MINUTES: i32 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub event_date: NaiveDate,
    #[serde(default)]
    pub event_time: Option<NaiveTime>,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    pub event_type: EventType,
    #[serde(default)]
    pub status: Option<EventStatus>,
    #[serde(default)]
    pub contact_id: Option<Uuid>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewEvent {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("title cannot be empty".to_string()));
        }
        validate_duration(self.duration_minutes)
    }
}

/// Partial update; `None` leaves a column unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPatch {
    pub title: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub event_time: Option<NaiveTime>,
    pub duration_minutes: Option<i32>,
    pub event_type: Option<EventType>,
    pub status: Option<EventStatus>,
    pub notes: Option<String>,
}

impl EventPatch {
    pub fn validate(&self) -> Result<(), AppError> {
        if matches!(self.title.as_deref(), Some(t) if t.trim().is_empty()) {
            return Err(AppError::Validation("title cannot be empty".to_string()));
        }
        validate_duration(self.duration_minutes)
    }
}

fn validate_duration(minutes: Option<i32>) -> Result<(), AppError> {
    match minutes {
        Some(m) if m <= 0 => Err(AppError::Validation(
            "duration_minutes must be positive".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Parses a `YYYY-MM` filter into the half-open date range `[first, next_first)`.
pub fn month_range(month: &str) -> Result<(NaiveDate, NaiveDate), AppError> {
    let invalid = || AppError::Validation(format!("month '{month}' must be YYYY-MM"));
    let (year, mon) = month.trim().split_once('-').ok_or_else(invalid)?;
    if year.len() != 4 || mon.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let mon: u32 = mon.parse().map_err(|_| invalid())?;

    let start = NaiveDate::from_ymd_opt(year, mon, 1).ok_or_else(invalid)?;
    let end = if start.month() == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, mon + 1, 1)
    }
    .ok_or_else(invalid)?;
    Ok((start, end))
}

pub async fn list(
    pool: &PgPool,
    uid: &str,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<Vec<CalendarEventRow>, AppError> {
    let (start, end) = range.unzip();
    Ok(sqlx::query_as::<_, CalendarEventRow>(
        r#"
        SELECT * FROM calendar_events
        WHERE uid = $1
          AND ($2::date IS NULL OR event_date >= $2)
          AND ($3::date IS NULL OR event_date < $3)
        ORDER BY event_date, event_time NULLS LAST
        "#,
    )
    .bind(uid)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?)
}

pub async fn insert(pool: &PgPool, uid: &str, event: &NewEvent) -> Result<CalendarEventRow, AppError> {
    if let Some(contact_id) = event.contact_id {
        let owned: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM contacts WHERE id = $1 AND uid = $2")
                .bind(contact_id)
                .bind(uid)
                .fetch_optional(pool)
                .await?;
        if owned.is_none() {
            return Err(AppError::NotFound(format!("Contact {contact_id} not found")));
        }
    }

    Ok(sqlx::query_as::<_, CalendarEventRow>(
        r#"
        INSERT INTO calendar_events
            (id, uid, contact_id, title, event_date, event_time,
             duration_minutes, event_type, status, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(uid)
    .bind(event.contact_id)
    .bind(event.title.trim())
    .bind(event.event_date)
    .bind(event.event_time)
    .bind(event.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES))
    .bind(event.event_type.as_str())
    .bind(event.status.unwrap_or(EventStatus::Pending).as_str())
    .bind(&event.notes)
    .fetch_one(pool)
    .await?)
}

pub async fn update(
    pool: &PgPool,
    uid: &str,
    id: Uuid,
    patch: &EventPatch,
) -> Result<CalendarEventRow, AppError> {
    sqlx::query_as::<_, CalendarEventRow>(
        r#"
        UPDATE calendar_events SET
            title = COALESCE($3, title),
            event_date = COALESCE($4, event_date),
            event_time = COALESCE($5, event_time),
            duration_minutes = COALESCE($6, duration_minutes),
            event_type = COALESCE($7, event_type),
            status = COALESCE($8, status),
            notes = COALESCE($9, notes),
            updated_at = now()
        WHERE id = $1 AND uid = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(uid)
    .bind(patch.title.as_deref().map(str::trim))
    .bind(patch.event_date)
    .bind(patch.event_time)
    .bind(patch.duration_minutes)
    .bind(patch.event_type.map(EventType::as_str))
    .bind(patch.status.map(EventStatus::as_str))
    .bind(&patch.notes)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Event {id} not found")))
}

pub async fn delete(pool: &PgPool, uid: &str, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM calendar_events WHERE id = $1 AND uid = $2")
        .bind(id)
        .bind(uid)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Event {id} not found")));
    }
    Ok(())
}
