//! Application Lab — LLM fit analysis of the stored resume against a job description.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::billing::store as billing;
use crate::billing::tier::Feature;
use crate::errors::AppError;
use crate::llm_client::prompts::{fill_template, json_system, FACTUALITY_INSTRUCTION};
use crate::llm_client::LlmClient;
use crate::resume::parser::ParsedResume;
use crate::resume::prompts::{FIT_ANALYSIS_PROMPT_TEMPLATE, FIT_ANALYSIS_ROLE};
use crate::resume::store;
use crate::state::AppState;

const MAX_JD_CHARS: usize = 12_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitAnalysis {
    pub score: i32,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub gaps: Vec<String>,
    #[serde(default)]
    pub suggested_bullets: Vec<String>,
}

impl FitAnalysis {
    /// Keeps the score inside 0..=100 whatever the model returned.
    fn clamped(mut self) -> Self {
        self.score = self.score.clamp(0, 100);
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct ApplicationLabRequest {
    pub job_description: String,
}

#[derive(Debug, Serialize)]
pub struct ApplicationLabResponse {
    pub analysis: FitAnalysis,
    pub credits_remaining: i32,
}

pub async fn run_application_lab(
    state: &AppState,
    uid: &str,
    request: ApplicationLabRequest,
) -> Result<ApplicationLabResponse, AppError> {
    let job_description = request.job_description.trim();
    if job_description.is_empty() {
        return Err(AppError::Validation(
            "job_description cannot be empty".to_string(),
        ));
    }

    let resume = store::find_parsed(&state.db, uid).await?.ok_or_else(|| {
        AppError::Validation("Upload a resume before using Application Lab".to_string())
    })?;

    let feature = Feature::ApplicationLab;
    let cost = feature.unit_cost().unsigned_abs();
    let charge = billing::charge(&state.db, uid, feature, cost, None).await?;

    match analyze_fit(&state.llm, &resume, job_description).await {
        Ok(analysis) => {
            info!("Application Lab score {} for user {uid}", analysis.score);
            Ok(ApplicationLabResponse {
                analysis,
                credits_remaining: charge.balance_after,
            })
        }
        Err(e) => {
            billing::refund_quietly(&state.db, uid, feature, cost, "analysis failed").await;
            Err(e)
        }
    }
}

pub async fn analyze_fit(
    llm: &LlmClient,
    resume: &ParsedResume,
    job_description: &str,
) -> Result<FitAnalysis, AppError> {
    let prompt = build_prompt(resume, job_description)?;
    let analysis: FitAnalysis = llm
        .call_json(&prompt, &json_system(FIT_ANALYSIS_ROLE))
        .await
        .map_err(|e| AppError::Llm(format!("Fit analysis failed: {e}")))?;
    Ok(analysis.clamped())
}

fn build_prompt(resume: &ParsedResume, job_description: &str) -> Result<String, AppError> {
    let resume_json = serde_json::to_string_pretty(resume)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize resume: {e}")))?;
    let jd: String = job_description.chars().take(MAX_JD_CHARS).collect();

    Ok(fill_template(
        FIT_ANALYSIS_PROMPT_TEMPLATE,
        &[
            ("resume_json", resume_json.as_str()),
            ("job_description", jd.as_str()),
            ("factuality", FACTUALITY_INSTRUCTION),
        ],
    ))
}
