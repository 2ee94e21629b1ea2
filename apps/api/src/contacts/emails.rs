//! Outreach email drafting — one batched LLM call per search run.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::contacts::prompts::{EMAIL_DRAFT_PROMPT_TEMPLATE, EMAIL_DRAFT_ROLE};
use crate::errors::AppError;
use crate::llm_client::prompts::{fill_template, json_system, FACTUALITY_INSTRUCTION};
use crate::llm_client::LlmClient;

/// What the drafter knows about the person sending the emails.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SenderProfile {
    pub name: Option<String>,
    pub school: Option<String>,
    pub major: Option<String>,
    pub headline: Option<String>,
}

/// Contact fields the drafter may reference.
#[derive(Debug, Clone, Serialize)]
pub struct EmailTarget {
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub location: Option<String>,
    pub college: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutreachEmail {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct DraftedEmail {
    index: usize,
    subject: String,
    body: String,
}

#[derive(Debug, Deserialize)]
struct DraftBatch {
    emails: Vec<DraftedEmail>,
}

/// Drafts an email for each target. The result is aligned with `targets`;
/// a slot is `None` when the model skipped that contact or returned an empty draft.
pub async fn draft_emails(
    llm: &LlmClient,
    sender: &SenderProfile,
    targets: &[EmailTarget],
) -> Result<Vec<Option<OutreachEmail>>, AppError> {
    if targets.is_empty() {
        return Ok(vec![]);
    }

    let prompt = build_prompt(sender, targets)?;
    let batch: DraftBatch = llm
        .call_json(&prompt, &json_system(EMAIL_DRAFT_ROLE))
        .await
        .map_err(|e| AppError::Llm(format!("Email drafting failed: {e}")))?;

    Ok(align(batch, targets.len()))
}

fn build_prompt(sender: &SenderProfile, targets: &[EmailTarget]) -> Result<String, AppError> {
    let contacts: Vec<_> = targets
        .iter()
        .enumerate()
        .map(|(index, t)| json!({ "index": index, "contact": t }))
        .collect();

    let sender_json = serde_json::to_string_pretty(sender)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize sender: {e}")))?;
    let contacts_json = serde_json::to_string_pretty(&contacts)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize contacts: {e}")))?;

    Ok(fill_template(
        EMAIL_DRAFT_PROMPT_TEMPLATE,
        &[
            ("sender_json", sender_json.as_str()),
            ("contacts_json", contacts_json.as_str()),
            ("factuality", FACTUALITY_INSTRUCTION),
        ],
    ))
}

fn align(batch: DraftBatch, len: usize) -> Vec<Option<OutreachEmail>> {
    let mut slots: Vec<Option<OutreachEmail>> = vec![None; len];
    for drafted in batch.emails {
        if drafted.subject.trim().is_empty() || drafted.body.trim().is_empty() {
            continue;
        }
        if let Some(slot) = slots.get_mut(drafted.index) {
            if slot.is_none() {
                *slot = Some(OutreachEmail {
                    subject: drafted.subject.trim().to_string(),
                    body: drafted.body.trim().to_string(),
                });
            }
        }
    }
    slots
}
