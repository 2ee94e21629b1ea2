pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::state::AppState;
use crate::{billing, calendar, contacts, directory, job_board, prep, resume, users};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/me", get(users::handlers::handle_me))
        // Billing
        .route(
            "/api/v1/billing/credits",
            get(billing::handlers::handle_get_credits),
        )
        .route(
            "/api/v1/billing/activity",
            get(billing::handlers::handle_get_activity),
        )
        .route(
            "/api/v1/billing/checkout",
            post(billing::handlers::handle_checkout),
        )
        .route(
            "/api/v1/billing/webhook",
            post(billing::handlers::handle_webhook),
        )
        // Contacts
        .route(
            "/api/v1/contacts",
            get(contacts::handlers::handle_list).post(contacts::handlers::handle_create),
        )
        .route(
            "/api/v1/contacts/search",
            post(contacts::handlers::handle_search),
        )
        .route(
            "/api/v1/contacts/:id",
            get(contacts::handlers::handle_get)
                .patch(contacts::handlers::handle_update)
                .delete(contacts::handlers::handle_delete),
        )
        // Calendar
        .route(
            "/api/v1/calendar/events",
            get(calendar::handlers::handle_list).post(calendar::handlers::handle_create),
        )
        .route(
            "/api/v1/calendar/events/:id",
            patch(calendar::handlers::handle_update).delete(calendar::handlers::handle_delete),
        )
        // Prep
        .route(
            "/api/v1/coffee-chat-prep",
            post(prep::handlers::handle_start_coffee_chat),
        )
        .route(
            "/api/v1/interview-prep",
            post(prep::handlers::handle_start_interview),
        )
        .route("/api/v1/preps", get(prep::handlers::handle_list))
        .route("/api/v1/preps/:id", get(prep::handlers::handle_get))
        .route("/api/v1/preps/:id/status", get(prep::handlers::handle_status))
        // Job board
        .route("/api/v1/jobs", get(job_board::handlers::handle_list_jobs))
        // Resume
        .route(
            "/api/v1/resume",
            get(resume::handlers::handle_get)
                .post(resume::handlers::handle_upload)
                .layer(DefaultBodyLimit::max(resume::handlers::MAX_RESUME_BYTES)),
        )
        .route(
            "/api/v1/application-lab",
            post(resume::handlers::handle_application_lab),
        )
        // Directory
        .route("/api/v1/directory", get(directory::handlers::handle_search))
        .with_state(state)
}
