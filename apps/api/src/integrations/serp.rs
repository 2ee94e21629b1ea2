//! SerpAPI — web search for prep research and Google Jobs for the job board.

use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::integrations::{http_client, read_json, IntegrationError};

const SERVICE: &str = "SerpAPI";
const SEARCH_URL: &str = "https://serpapi.com/search.json";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResponse {
    #[serde(default)]
    organic_results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct JobExtensions {
    pub posted_at: Option<String>,
    pub schedule_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApplyOption {
    pub title: Option<String>,
    pub link: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobListing {
    pub title: String,
    pub company_name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub detected_extensions: JobExtensions,
    #[serde(default)]
    pub apply_options: Vec<ApplyOption>,
}

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobsResponse {
    #[serde(default)]
    jobs_results: Vec<JobListing>,
    #[serde(default)]
    serpapi_pagination: Pagination,
}

/// One page of Google Jobs results plus the token for the next page, if any.
#[derive(Debug)]
pub struct JobsPage {
    pub jobs: Vec<JobListing>,
    pub next_page_token: Option<String>,
}

#[derive(Clone)]
pub struct SerpClient {
    client: Client,
    api_key: String,
}

impl SerpClient {
    pub fn new(api_key: String) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            api_key,
        })
    }

    /// Google organic results for `query`, at most `num`.
    pub async fn search(&self, query: &str, num: u32) -> Result<Vec<SearchResult>, IntegrationError> {
        let num = num.to_string();
        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("num", num.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(IntegrationError::http(SERVICE))?;

        let parsed: OrganicResponse = read_json(SERVICE, response).await?;
        Ok(parsed.organic_results)
    }

    /// A single page of Google Jobs results.
    pub async fn jobs_page(
        &self,
        query: &str,
        location: Option<&str>,
        page_token: Option<&str>,
    ) -> Result<JobsPage, IntegrationError> {
        let mut params = vec![
            ("engine", "google_jobs"),
            ("q", query),
            ("api_key", self.api_key.as_str()),
        ];
        if let Some(location) = location {
            params.push(("location", location));
        }
        if let Some(token) = page_token {
            params.push(("next_page_token", token));
        }

        let response = self
            .client
            .get(SEARCH_URL)
            .query(&params)
            .send()
            .await
            .map_err(IntegrationError::http(SERVICE))?;

        let parsed: JobsResponse = read_json(SERVICE, response).await?;
        Ok(JobsPage {
            jobs: parsed.jobs_results,
            next_page_token: parsed.serpapi_pagination.next_page_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jobs_response_parses_pagination() {
        let json = r#"{
            "jobs_results": [{
                "title": "Investment Banking Analyst",
                "company_name": "Evercore",
                "location": "New York, NY",
                "detected_extensions": {"posted_at": "3 days ago"},
                "apply_options": [{"title": "LinkedIn", "link": "https://example.com/apply"}]
            }],
            "serpapi_pagination": {"next_page_token": "abc"}
        }"#;
        let parsed: JobsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.jobs_results.len(), 1);
        assert_eq!(
            parsed.jobs_results[0].detected_extensions.posted_at.as_deref(),
            Some("3 days ago")
        );
        assert_eq!(parsed.serpapi_pagination.next_page_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_jobs_response_tolerates_missing_sections() {
        let parsed: JobsResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.jobs_results.is_empty());
        assert!(parsed.serpapi_pagination.next_page_token.is_none());
    }

    #[test]
    fn test_organic_results_parse() {
        let json = r#"{"organic_results": [{"title": "Acme raises $50M", "link": "https://news.example.com/acme"}]}"#;
        let parsed: OrganicResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.organic_results[0].title, "Acme raises $50M");
        assert!(parsed.organic_results[0].snippet.is_none());
    }
}
