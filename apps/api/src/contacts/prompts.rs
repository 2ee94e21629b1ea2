// Prompt constants for outreach email drafting.

/// Role description for the email drafter; combined with the JSON-only rule.
pub const EMAIL_DRAFT_ROLE: &str = "You are a career coach who writes short, warm, specific \
    networking emails from students and early-career professionals to people they admire.";

/// Batch email prompt. Replace `{sender_json}`, `{contacts_json}` and `{factuality}`.
pub const EMAIL_DRAFT_PROMPT_TEMPLATE: &str = r#"Write one outreach email for each contact below.

The sender:
{sender_json}

The contacts (each has an "index"):
{contacts_json}

Rules:
- 90 to 140 words per body, plain text, no placeholders like [Name].
- Mention a concrete shared point when one exists (same school, same company, same city).
- Ask for a 15-20 minute chat; do not ask for a job or referral.
- Sign off with the sender's first name when known.
- {factuality}

Return a JSON object with this EXACT schema:
{
  "emails": [
    {"index": 0, "subject": "Fellow Wolverine interested in your path at Evercore", "body": "Hi Jane, ..."}
  ]
}"#;
