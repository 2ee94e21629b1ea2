use aws_sdk_s3::Client as S3Client;
use redis::Client as RedisClient;
use sqlx::{PgPool, SqlitePool};

use crate::auth::FirebaseAuth;
use crate::config::Config;
use crate::integrations::people_data::PeopleDataClient;
use crate::integrations::serp::SerpClient;
use crate::integrations::stripe::StripeClient;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Prep-status cache for the polling endpoint.
    pub redis: RedisClient,
    pub s3: S3Client,
    pub llm: LlmClient,
    pub people: PeopleDataClient,
    pub serp: SerpClient,
    pub stripe: StripeClient,
    pub auth: FirebaseAuth,
    /// Legacy directory file; `None` when `DIRECTORY_DB_PATH` is unset.
    pub directory: Option<SqlitePool>,
    pub config: Config,
}
