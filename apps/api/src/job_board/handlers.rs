//! Axum route handlers for the Job Board.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::billing::store as billing;
use crate::billing::tier::Feature;
use crate::errors::AppError;
use crate::job_board::filter::{filter_jobs, profile_keywords, ScoredJob, DEFAULT_MAX_AGE_DAYS};
use crate::integrations::serp::JobListing;
use crate::resume;
use crate::state::AppState;

const MAX_PAGES: usize = 3;

#[derive(Debug, Deserialize)]
pub struct JobsQuery {
    pub query: String,
    pub location: Option<String>,
    pub max_age_days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct JobsResponse {
    pub jobs: Vec<ScoredJob>,
    pub pages_fetched: usize,
    pub total_seen: usize,
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<JobsQuery>,
) -> Result<Json<JobsResponse>, AppError> {
    let query = params.query.trim();
    if query.is_empty() {
        return Err(AppError::Validation("query cannot be empty".to_string()));
    }
    let location = params
        .location
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty());
    let max_age_days = params.max_age_days.unwrap_or(DEFAULT_MAX_AGE_DAYS);

    billing::charge(&state.db, &auth.uid, Feature::JobBoard, 0, None).await?;

    let (raw, pages_fetched) = fetch_pages(&state, query, location).await?;
    let total_seen = raw.len();

    let skills = match resume::store::find_parsed(&state.db, &auth.uid).await {
        Ok(parsed) => parsed.map(|p| p.skills).unwrap_or_default(),
        Err(e) => {
            warn!("Scoring jobs without resume skills for user {}: {e}", auth.uid);
            vec![]
        }
    };
    let keywords = profile_keywords(query, &skills);
    let jobs = filter_jobs(raw, &keywords, max_age_days);

    info!(
        "Job board for user {}: kept {}/{} postings from {pages_fetched} pages",
        auth.uid,
        jobs.len(),
        total_seen
    );
    Ok(Json(JobsResponse {
        jobs,
        pages_fetched,
        total_seen,
    }))
}

/// Follows `next_page_token` for up to `MAX_PAGES` pages. Only a first-page failure is an error.
async fn fetch_pages(
    state: &AppState,
    query: &str,
    location: Option<&str>,
) -> Result<(Vec<JobListing>, usize), AppError> {
    let mut jobs = Vec::new();
    let mut token: Option<String> = None;
    let mut pages = 0;

    while pages < MAX_PAGES {
        let page = match state.serp.jobs_page(query, location, token.as_deref()).await {
            Ok(page) => page,
            Err(e) if pages == 0 => return Err(e.into()),
            Err(e) => {
                warn!("Stopping job pagination after {pages} pages: {e}");
                break;
            }
        };
        pages += 1;
        jobs.extend(page.jobs);
        match page.next_page_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }
    Ok((jobs, pages))
}
