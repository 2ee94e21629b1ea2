//! Thin clients for the third-party APIs Offerloop calls besides the LLM.
//!
//! Each client owns a `reqwest::Client` and maps failures into `IntegrationError`,
//! which `AppError` surfaces as 502.

use reqwest::Response;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub mod people_data;
pub mod serp;
pub mod stripe;

const HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("{service} HTTP error: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} API error (status {status}): {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("{service} returned an unexpected payload: {message}")]
    Parse {
        service: &'static str,
        message: String,
    },
}

impl IntegrationError {
    pub fn service(&self) -> &'static str {
        match self {
            IntegrationError::Http { service, .. }
            | IntegrationError::Api { service, .. }
            | IntegrationError::Parse { service, .. } => service,
        }
    }

    pub(crate) fn http(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| IntegrationError::Http { service, source }
    }
}

pub(crate) fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
}

/// Reads a JSON body, turning non-2xx statuses into `IntegrationError::Api`.
pub(crate) async fn read_json<T: DeserializeOwned>(
    service: &'static str,
    response: Response,
) -> Result<T, IntegrationError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(IntegrationError::http(service))?;

    if !status.is_success() {
        return Err(IntegrationError::Api {
            service,
            status: status.as_u16(),
            message: truncate(&body, 500),
        });
    }

    serde_json::from_str(&body).map_err(|e| IntegrationError::Parse {
        service,
        message: e.to_string(),
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max_chars).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_short_text() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        let out = truncate("ééééé", 2);
        assert_eq!(out, "éé…");
    }

    #[test]
    fn test_service_name_is_reported() {
        let err = IntegrationError::Parse {
            service: "SerpAPI",
            message: "missing field".to_string(),
        };
        assert_eq!(err.service(), "SerpAPI");
        assert!(err.to_string().starts_with("SerpAPI returned"));
    }
}
