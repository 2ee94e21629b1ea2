//! Firebase ID token authentication.
//!
//! Every `/api/v1` handler takes an `AuthUser`. The extractor verifies the bearer
//! token against Google's securetoken JWKS and loads (or provisions) the user row.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::state::AppState;
use crate::users;

const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
/// Unknown `kid`s trigger at most one key fetch per interval.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseClaims {
    pub aud: String,
    pub iss: String,
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Default)]
struct KeyCache {
    set: Option<JwkSet>,
    fetched_at: Option<Instant>,
}

impl KeyCache {
    fn key(&self, kid: &str) -> Result<Option<DecodingKey>, AppError> {
        match self.set.as_ref().and_then(|set| set.find(kid)) {
            Some(jwk) => DecodingKey::from_jwk(jwk)
                .map(Some)
                .map_err(|e| AppError::Unauthorized(format!("unusable signing key: {e}"))),
            None => Ok(None),
        }
    }

    fn refresh_allowed(&self, now: Instant) -> bool {
        self.fetched_at
            .map_or(true, |at| now.saturating_duration_since(at) >= MIN_REFRESH_INTERVAL)
    }
}

/// Verifies Firebase ID tokens. Keys are cached; an unknown `kid` refreshes them,
/// at most once per `MIN_REFRESH_INTERVAL`.
#[derive(Clone)]
pub struct FirebaseAuth {
    project_id: String,
    http: reqwest::Client,
    keys: Arc<RwLock<KeyCache>>,
}

impl FirebaseAuth {
    pub fn new(project_id: String) -> anyhow::Result<Self> {
        Ok(Self {
            project_id,
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()?,
            keys: Arc::new(RwLock::new(KeyCache::default())),
        })
    }

    async fn fetch_keys(&self) -> Result<JwkSet, AppError> {
        let jwks: JwkSet = self
            .http
            .get(FIREBASE_JWKS_URL)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Fetching Firebase keys failed: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Parsing Firebase keys failed: {e}")))?;

        info!("Refreshed Firebase signing keys ({} keys)", jwks.keys.len());
        Ok(jwks)
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, AppError> {
        let unknown = || AppError::Unauthorized(format!("unknown signing key '{kid}'"));

        let cached = self.keys.read().await.key(kid)?;
        if let Some(key) = cached {
            return Ok(key);
        }

        let mut cache = self.keys.write().await;
        // Another request may have refreshed while this one waited for the lock.
        if let Some(key) = cache.key(kid)? {
            return Ok(key);
        }
        let now = Instant::now();
        if !cache.refresh_allowed(now) {
            return Err(unknown());
        }
        cache.fetched_at = Some(now);
        cache.set = Some(self.fetch_keys().await?);
        cache.key(kid)?.ok_or_else(unknown)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!(
            "https://securetoken.google.com/{}",
            self.project_id
        )]);
        validation
    }

    pub async fn verify(&self, token: &str) -> Result<FirebaseClaims, AppError> {
        let header =
            decode_header(token).map_err(|e| AppError::Unauthorized(format!("bad token header: {e}")))?;
        if header.alg != Algorithm::RS256 {
            return Err(AppError::Unauthorized(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| AppError::Unauthorized("token has no kid".to_string()))?;

        let key = self.decoding_key(&kid).await?;
        let data = decode::<FirebaseClaims>(token, &key, &self.validation())
            .map_err(|e| AppError::Unauthorized(format!("token rejected: {e}")))?;

        if data.claims.sub.is_empty() {
            return Err(AppError::Unauthorized("token has empty subject".to_string()));
        }
        Ok(data.claims)
    }
}

/// Extracts the raw token from `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("non-ASCII Authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Authorization header is not a bearer token".to_string()))
}

/// The authenticated caller and their user row as of this request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub user: UserRow,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let claims = state.auth.verify(token).await.map_err(|e| {
            warn!("Token verification failed: {e}");
            e
        })?;

        let email = claims
            .email
            .clone()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::Unauthorized("token carries no email".to_string()))?;

        let user =
            users::store::get_or_create(&state.db, &claims.sub, &email, claims.name.as_deref())
                .await?;

        Ok(AuthUser {
            uid: claims.sub,
            email,
            user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extracted() {
        let h = headers("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&h).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_header_is_unauthorized() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_basic_scheme_is_rejected() {
        assert!(matches!(
            bearer_token(&headers("Basic dXNlcjpwYXNz")),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_empty_bearer_is_rejected() {
        assert!(matches!(
            bearer_token(&headers("Bearer   ")),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_garbage_token_rejected_before_key_fetch() {
        let auth = FirebaseAuth::new("offerloop-test".to_string()).unwrap();
        let result = auth.verify("not-a-jwt").await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
        assert!(auth.keys.read().await.set.is_none());
    }

    #[test]
    fn test_key_refresh_is_rate_limited() {
        let now = Instant::now();
        let mut cache = KeyCache::default();
        assert!(cache.refresh_allowed(now));

        cache.fetched_at = Some(now);
        assert!(!cache.refresh_allowed(now));
        assert!(!cache.refresh_allowed(now + Duration::from_secs(59)));
        assert!(cache.refresh_allowed(now + MIN_REFRESH_INTERVAL));
    }

    #[tokio::test]
    async fn test_unknown_kid_within_interval_is_rejected_without_fetch() {
        let auth = FirebaseAuth::new("offerloop-test".to_string()).unwrap();
        auth.keys.write().await.fetched_at = Some(Instant::now());

        let result = auth.decoding_key("rotated-kid").await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
        assert!(auth.keys.read().await.set.is_none());
    }

    #[test]
    fn test_validation_pins_project() {
        let auth = FirebaseAuth::new("offerloop-test".to_string()).unwrap();
        let validation = auth.validation();
        assert!(validation
            .iss
            .as_ref()
            .unwrap()
            .contains("https://securetoken.google.com/offerloop-test"));
    }
}
