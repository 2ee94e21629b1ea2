pub const COFFEE_CHAT_ROLE: &str =
    "You are a career coach preparing a student for an informational coffee chat.";

/// Placeholders: {contact_json}, {research}, {factuality}
pub const COFFEE_CHAT_PROMPT_TEMPLATE: &str = r#"Prepare a coffee chat brief for the meeting described below.

Contact:
{contact_json}

Web research (may be empty):
{research}

{factuality}

Return JSON with exactly this shape:
{
  "contact_summary": "2-3 sentences on who the contact is and what they work on",
  "company_overview": "2-3 sentences on the company",
  "recent_news": ["one line per relevant recent item from the research"],
  "talking_points": ["4-6 specific conversation openers"],
  "questions_to_ask": ["5-8 thoughtful questions"]
}"#;

pub const INTERVIEW_ROLE: &str =
    "You are an interview coach who has studied many hiring processes.";

/// Placeholders: {role_json}, {job_description}, {research}, {factuality}
pub const INTERVIEW_PROMPT_TEMPLATE: &str = r#"Prepare an interview brief for the role below.

Role:
{role_json}

Job description (may be empty):
{job_description}

Web research on the company's interview process (may be empty):
{research}

{factuality}

Return JSON with exactly this shape:
{
  "company_overview": "2-3 sentences on the company",
  "role_summary": "2-3 sentences on what the role involves",
  "interview_process": ["one line per known stage, in order"],
  "likely_questions": [{"question": "...", "tip": "how to approach it"}],
  "preparation_tips": ["4-6 concrete preparation steps"]
}"#;
