//! Background prep generation.
//!
//! Pipeline: web research → LLM document → markdown → S3 → row `completed`.
//! Any failure marks the row `failed` and refunds the credits charged for it.

use aws_sdk_s3::primitives::ByteStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::billing::store as billing;
use crate::errors::AppError;
use crate::integrations::serp::SearchResult;
use crate::llm_client::prompts::{fill_template, json_system, FACTUALITY_INSTRUCTION};
use crate::models::prep::{PrepKind, PrepStatus};
use crate::prep::prompts::{
    COFFEE_CHAT_PROMPT_TEMPLATE, COFFEE_CHAT_ROLE, INTERVIEW_PROMPT_TEMPLATE, INTERVIEW_ROLE,
};
use crate::prep::render::{render_coffee_chat, render_interview, CoffeeChatDoc, InterviewDoc};
use crate::prep::status::{self, PrepStatusView};
use crate::prep::store;
use crate::state::AppState;

const RESEARCH_RESULTS: u32 = 8;
const MAX_JD_CHARS: usize = 8_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoffeeChatInput {
    pub contact_name: String,
    pub company: String,
    pub job_title: String,
    #[serde(default)]
    pub linkedin_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewInput {
    pub company: String,
    pub job_title: String,
    #[serde(default)]
    pub job_description: Option<String>,
}

#[derive(Debug, Clone)]
pub enum PrepInput {
    CoffeeChat(CoffeeChatInput),
    Interview(InterviewInput),
}

fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl PrepInput {
    pub fn kind(&self) -> PrepKind {
        match self {
            PrepInput::CoffeeChat(_) => PrepKind::CoffeeChat,
            PrepInput::Interview(_) => PrepKind::Interview,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        match self {
            PrepInput::CoffeeChat(input) => {
                require("contact_name", &input.contact_name)?;
                require("company", &input.company)?;
                require("job_title", &input.job_title)
            }
            PrepInput::Interview(input) => {
                require("company", &input.company)?;
                require("job_title", &input.job_title)
            }
        }
    }

    pub fn to_json(&self) -> Result<Value, AppError> {
        let value = match self {
            PrepInput::CoffeeChat(input) => serde_json::to_value(input),
            PrepInput::Interview(input) => serde_json::to_value(input),
        };
        value.map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode prep input: {e}")))
    }

    pub fn research_query(&self) -> String {
        match self {
            PrepInput::CoffeeChat(input) => format!(
                "{} {} {}",
                input.contact_name.trim(),
                input.job_title.trim(),
                input.company.trim()
            ),
            PrepInput::Interview(input) => format!(
                "{} {} interview process questions",
                input.company.trim(),
                input.job_title.trim()
            ),
        }
    }
}

/// Research results as a numbered plain-text block for the prompt.
pub fn format_research(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "(no research results)".to_string();
    }
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let mut line = format!("{}. {}", i + 1, r.title.trim());
            if let Some(date) = r.date.as_deref() {
                line.push_str(&format!(" ({date})"));
            }
            if let Some(snippet) = r.snippet.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                line.push_str(&format!("\n   {snippet}"));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn encode<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode prompt input: {e}")))
}

pub fn build_prompt(input: &PrepInput, research: &str) -> Result<String, AppError> {
    Ok(match input {
        PrepInput::CoffeeChat(c) => fill_template(
            COFFEE_CHAT_PROMPT_TEMPLATE,
            &[
                ("contact_json", encode(c)?.as_str()),
                ("research", research),
                ("factuality", FACTUALITY_INSTRUCTION),
            ],
        ),
        PrepInput::Interview(i) => {
            let jd: String = i
                .job_description
                .as_deref()
                .unwrap_or_default()
                .chars()
                .take(MAX_JD_CHARS)
                .collect();
            let role = serde_json::json!({ "company": i.company, "job_title": i.job_title });
            fill_template(
                INTERVIEW_PROMPT_TEMPLATE,
                &[
                    ("role_json", encode(&role)?.as_str()),
                    ("job_description", jd.as_str()),
                    ("research", research),
                    ("factuality", FACTUALITY_INSTRUCTION),
                ],
            )
        }
    })
}

/// What a finished job leaves behind: the structured document and its markdown.
struct Generated {
    document: Value,
    markdown: String,
}

async fn generate(state: &AppState, input: &PrepInput) -> Result<Generated, AppError> {
    let research = match state.serp.search(&input.research_query(), RESEARCH_RESULTS).await {
        Ok(results) => format_research(&results),
        Err(e) => {
            warn!("Prep research unavailable, continuing without it: {e}");
            format_research(&[])
        }
    };
    let prompt = build_prompt(input, &research)?;

    let to_value = |v: Result<Value, serde_json::Error>| {
        v.map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode prep document: {e}")))
    };

    match input {
        PrepInput::CoffeeChat(c) => {
            let doc: CoffeeChatDoc = state
                .llm
                .call_json(&prompt, &json_system(COFFEE_CHAT_ROLE))
                .await
                .map_err(|e| AppError::Llm(format!("Coffee chat prep failed: {e}")))?;
            Ok(Generated {
                markdown: render_coffee_chat(c.contact_name.trim(), c.company.trim(), &doc),
                document: to_value(serde_json::to_value(&doc))?,
            })
        }
        PrepInput::Interview(i) => {
            let doc: InterviewDoc = state
                .llm
                .call_json(&prompt, &json_system(INTERVIEW_ROLE))
                .await
                .map_err(|e| AppError::Llm(format!("Interview prep failed: {e}")))?;
            Ok(Generated {
                markdown: render_interview(i.company.trim(), i.job_title.trim(), &doc),
                document: to_value(serde_json::to_value(&doc))?,
            })
        }
    }
}

async fn complete(state: &AppState, uid: &str, prep_id: Uuid, input: &PrepInput) -> Result<(), AppError> {
    let generated = generate(state, input).await?;

    let s3_key = format!("preps/{uid}/{prep_id}.md");
    state
        .s3
        .put_object()
        .bucket(&state.config.s3_bucket)
        .key(&s3_key)
        .body(ByteStream::from(generated.markdown.into_bytes()))
        .content_type("text/markdown; charset=utf-8")
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Prep upload failed: {e}")))?;

    store::mark_completed(&state.db, prep_id, &generated.document, &s3_key).await
}

/// Terminal status of a finished job and the credits it owes back.
#[derive(Debug, PartialEq)]
struct Settlement {
    view: PrepStatusView,
    refund: u32,
}

/// A completed prep keeps its charge; a failed one is refunded in full.
fn settle(prep_id: Uuid, uid: &str, outcome: &Result<(), AppError>, cost: u32) -> Settlement {
    let (status, error, refund) = match outcome {
        Ok(()) => (PrepStatus::Completed, None, 0),
        Err(e) => (PrepStatus::Failed, Some(e.public_message()), cost),
    };
    Settlement {
        view: PrepStatusView {
            prep_id,
            uid: uid.to_string(),
            status,
            error,
        },
        refund,
    }
}

/// Runs one prep job to a terminal state. Spawned by the start handlers.
pub async fn run_prep(state: AppState, uid: String, prep_id: Uuid, input: PrepInput, cost: u32) {
    let kind = input.kind();
    info!("Prep {prep_id} ({}) started for user {uid}", kind.as_str());

    let outcome = complete(&state, &uid, prep_id, &input).await;
    match &outcome {
        Ok(()) => info!("Prep {prep_id} completed"),
        Err(e) => error!("Prep {prep_id} failed: {e}"),
    }

    let settlement = settle(prep_id, &uid, &outcome, cost);
    if let Some(message) = &settlement.view.error {
        if let Err(db_err) = store::mark_failed(&state.db, prep_id, message).await {
            error!("Could not record failure of prep {prep_id}: {db_err}");
        }
    }
    if settlement.refund > 0 {
        billing::refund_quietly(&state.db, &uid, kind.feature(), settlement.refund, "prep failed")
            .await;
    }

    status::publish(&state, &settlement.view).await;
}
