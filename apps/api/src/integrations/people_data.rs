//! People Data Labs person search.

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::integrations::{http_client, read_json, IntegrationError};

const SERVICE: &str = "People Data Labs";
const PERSON_SEARCH_URL: &str = "https://api.peopledatalabs.com/v5/person/search";

/// Filters for a person search. Empty optional fields are not sent.
#[derive(Debug, Clone, Default)]
pub struct PersonQuery {
    pub job_title: String,
    pub company: Option<String>,
    pub location: String,
    pub college: Option<String>,
    pub size: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PdlSchool {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PdlEducation {
    pub school: Option<PdlSchool>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PdlPerson {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub work_email: Option<String>,
    #[serde(default)]
    pub personal_emails: Vec<String>,
    pub recommended_personal_email: Option<String>,
    pub job_title: Option<String>,
    pub job_company_name: Option<String>,
    pub location_name: Option<String>,
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub education: Vec<PdlEducation>,
}

impl PdlPerson {
    /// First usable address among the work email, the recommended personal one,
    /// and the personal list, in that order.
    pub fn best_email(&self) -> Option<&str> {
        self.work_email
            .as_deref()
            .into_iter()
            .chain(self.recommended_personal_email.as_deref())
            .chain(self.personal_emails.iter().map(String::as_str))
            .map(str::trim)
            .find(|e| e.contains('@'))
    }

    /// First school whose name contains `college`, case-insensitively.
    pub fn matching_school(&self, college: &str) -> Option<&str> {
        let needle = college.to_lowercase();
        self.education
            .iter()
            .filter_map(|e| e.school.as_ref().and_then(|s| s.name.as_deref()))
            .find(|name| name.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<PdlPerson>,
}

#[derive(Clone)]
pub struct PeopleDataClient {
    client: Client,
    api_key: String,
}

impl PeopleDataClient {
    pub fn new(api_key: String) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            api_key,
        })
    }

    /// Runs a person search. PDL answers 404 when nothing matches; that is an empty result.
    pub async fn search(&self, query: &PersonQuery) -> Result<Vec<PdlPerson>, IntegrationError> {
        let body = build_search_body(query);
        debug!("PDL search: {body}");

        let response = self
            .client
            .post(PERSON_SEARCH_URL)
            .header("X-Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(IntegrationError::http(SERVICE))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(vec![]);
        }

        let parsed: SearchResponse = read_json(SERVICE, response).await?;
        Ok(parsed.data)
    }
}

fn build_search_body(query: &PersonQuery) -> Value {
    let mut must = vec![
        json!({ "match": { "job_title": query.job_title } }),
        json!({ "match": { "location_name": query.location } }),
    ];
    if let Some(company) = non_empty(query.company.as_deref()) {
        must.push(json!({ "match": { "job_company_name": company } }));
    }
    if let Some(college) = non_empty(query.college.as_deref()) {
        must.push(json!({ "match": { "education.school.name": college } }));
    }

    json!({
        "query": { "bool": { "must": must } },
        "size": query.size,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_body_skips_empty_filters() {
        let body = build_search_body(&PersonQuery {
            job_title: "Analyst".to_string(),
            company: Some("  ".to_string()),
            location: "New York".to_string(),
            college: None,
            size: 5,
        });
        let must = body["query"]["bool"]["must"].as_array().unwrap();
        assert_eq!(must.len(), 2);
        assert_eq!(body["size"], 5);
    }

    #[test]
    fn test_search_body_includes_college() {
        let body = build_search_body(&PersonQuery {
            job_title: "Analyst".to_string(),
            company: Some("Goldman Sachs".to_string()),
            location: "New York".to_string(),
            college: Some("University of Michigan".to_string()),
            size: 3,
        });
        let text = body.to_string();
        assert!(text.contains("education.school.name"));
        assert!(text.contains("Goldman Sachs"));
    }

    #[test]
    fn test_best_email_prefers_work_email() {
        let person = PdlPerson {
            work_email: Some("jane@acme.com".to_string()),
            personal_emails: vec!["jane@gmail.com".to_string()],
            ..Default::default()
        };
        assert_eq!(person.best_email(), Some("jane@acme.com"));
    }

    #[test]
    fn test_best_email_skips_unusable_candidates() {
        let person = PdlPerson {
            work_email: Some("   ".to_string()),
            recommended_personal_email: Some("n/a".to_string()),
            personal_emails: vec!["".to_string(), " jane@gmail.com ".to_string()],
            ..Default::default()
        };
        assert_eq!(person.best_email(), Some("jane@gmail.com"));

        let nothing = PdlPerson {
            work_email: Some("unknown".to_string()),
            ..Default::default()
        };
        assert_eq!(nothing.best_email(), None);
    }

    #[test]
    fn test_best_email_rejects_garbage() {
        let person = PdlPerson {
            personal_emails: vec!["not-an-email".to_string()],
            ..Default::default()
        };
        assert_eq!(person.best_email(), None);
    }

    #[test]
    fn test_person_deserializes_with_missing_fields() {
        let person: PdlPerson = serde_json::from_str(
            r#"{"first_name": "Ana", "education": [{"school": {"name": "University of Michigan"}}]}"#,
        )
        .unwrap();
        assert_eq!(person.first_name.as_deref(), Some("Ana"));
        assert_eq!(person.matching_school("michigan"), Some("University of Michigan"));
        assert!(person.personal_emails.is_empty());
    }
}
