//! Resume parsing — PDF text extraction followed by an LLM structuring pass.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::prompts::{fill_template, json_system};
use crate::llm_client::LlmClient;
use crate::resume::prompts::{RESUME_PARSE_PROMPT_TEMPLATE, RESUME_PARSE_ROLE};

/// Upper bound on resume text sent to the model.
const MAX_RESUME_CHARS: usize = 20_000;
/// Below this the PDF is almost certainly scanned images, not text.
const MIN_RESUME_CHARS: usize = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumeExperience {
    pub company: Option<String>,
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedResume {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub school: Option<String>,
    pub major: Option<String>,
    pub graduation_year: Option<i32>,
    pub headline: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experiences: Vec<ResumeExperience>,
}

/// Extracts plain text from PDF bytes on the blocking pool.
pub async fn extract_pdf_text(bytes: bytes::Bytes) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF extraction task failed: {e}")))?
        .map_err(|e| AppError::Validation(format!("Could not read PDF: {e}")))?;

    let text = normalize_text(&text);
    if text.chars().count() < MIN_RESUME_CHARS {
        return Err(AppError::Validation(
            "The PDF contains too little text. Upload a text-based PDF rather than a scan."
                .to_string(),
        ));
    }
    Ok(text)
}

/// Collapses runs of spaces and blank lines left behind by PDF layout.
pub fn normalize_text(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn parse_resume(text: &str, llm: &LlmClient) -> Result<ParsedResume, AppError> {
    let clipped: String = text.chars().take(MAX_RESUME_CHARS).collect();
    let prompt = fill_template(RESUME_PARSE_PROMPT_TEMPLATE, &[("resume_text", clipped.as_str())]);

    let mut parsed: ParsedResume = llm
        .call_json(&prompt, &json_system(RESUME_PARSE_ROLE))
        .await
        .map_err(|e| AppError::Llm(format!("Resume parsing failed: {e}")))?;

    tidy_skills(&mut parsed.skills);
    info!(
        "Parsed resume: {} skills, {} experiences",
        parsed.skills.len(),
        parsed.experiences.len()
    );
    Ok(parsed)
}

/// Trims skills and drops empties and case-insensitive duplicates, keeping first spelling.
fn tidy_skills(skills: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    skills.retain_mut(|s| {
        *s = s.trim().to_string();
        !s.is_empty() && seen.insert(s.to_lowercase())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text_collapses_whitespace() {
        let raw = "Jordan   Smith\n\n\n   Economics \t Student\n";
        assert_eq!(normalize_text(raw), "Jordan Smith\nEconomics Student");
    }

    #[test]
    fn test_tidy_skills_dedups_case_insensitively() {
        let mut skills = vec![
            " Python ".to_string(),
            "python".to_string(),
            "".to_string(),
            "Excel".to_string(),
        ];
        tidy_skills(&mut skills);
        assert_eq!(skills, vec!["Python".to_string(), "Excel".to_string()]);
    }

    #[test]
    fn test_parsed_resume_tolerates_missing_lists() {
        let parsed: ParsedResume =
            serde_json::from_str(r#"{"name": "Jordan", "graduation_year": 2026}"#).unwrap();
        assert_eq!(parsed.graduation_year, Some(2026));
        assert!(parsed.skills.is_empty());
        assert!(parsed.experiences.is_empty());
    }

    #[tokio::test]
    async fn test_non_pdf_bytes_are_rejected() {
        let result = extract_pdf_text(bytes::Bytes::from_static(b"definitely not a pdf")).await;
        assert!(result.is_err());
    }
}
