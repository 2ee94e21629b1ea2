use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub openai_api_key: String,
    pub pdl_api_key: String,
    pub serpapi_key: String,
    pub stripe_secret_key: String,
    pub stripe_price_pro: String,
    pub stripe_price_elite: String,
    pub firebase_project_id: String,
    pub frontend_url: String,
    /// Legacy SQLite directory file. The directory endpoint answers 503 when unset.
    pub directory_db_path: Option<PathBuf>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            pdl_api_key: require_env("PDL_API_KEY")?,
            serpapi_key: require_env("SERPAPI_KEY")?,
            stripe_secret_key: require_env("STRIPE_SECRET_KEY")?,
            stripe_price_pro: require_env("STRIPE_PRICE_PRO")?,
            stripe_price_elite: require_env("STRIPE_PRICE_ELITE")?,
            firebase_project_id: require_env("FIREBASE_PROJECT_ID")?,
            frontend_url: require_env("FRONTEND_URL")?
                .trim_end_matches('/')
                .to_string(),
            directory_db_path: optional_env("DIRECTORY_DB_PATH").map(PathBuf::from),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
