// All LLM prompt constants for the Resume module.

pub const RESUME_PARSE_ROLE: &str =
    "You are a meticulous resume parser that converts resume text into structured data.";

/// Resume parsing prompt. Replace `{resume_text}` before sending.
pub const RESUME_PARSE_PROMPT_TEMPLATE: &str = r#"Extract structured information from the resume below.

Return a JSON object with this EXACT schema (use null or [] when absent):
{
  "name": "Jordan Smith",
  "email": "jordan@umich.edu",
  "phone": null,
  "school": "University of Michigan",
  "major": "Economics",
  "graduation_year": 2026,
  "headline": "Economics student focused on investment banking",
  "skills": ["Excel", "Financial modeling", "Python"],
  "experiences": [
    {
      "company": "Acme Capital",
      "title": "Summer Analyst",
      "start": "2025-06",
      "end": "2025-08",
      "highlights": ["Built a three-statement model for a $40M acquisition"]
    }
  ]
}

Copy facts exactly as written. Do not infer missing dates or titles.

RESUME:
{resume_text}"#;

pub const FIT_ANALYSIS_ROLE: &str = "You are a recruiter who evaluates how well a candidate's \
    resume fits a specific job description and gives concrete, honest feedback.";

/// Application Lab prompt. Replace `{resume_json}`, `{job_description}` and `{factuality}`.
pub const FIT_ANALYSIS_PROMPT_TEMPLATE: &str = r#"Compare the candidate's resume with the job description.

CANDIDATE RESUME (structured):
{resume_json}

JOB DESCRIPTION:
{job_description}

Rules:
- score is an integer from 0 to 100 reflecting overall fit.
- strengths and gaps are short phrases tied to specific requirements.
- suggested_bullets rewrite existing resume experience to target this role. {factuality}

Return a JSON object with this EXACT schema:
{
  "score": 72,
  "summary": "One or two sentences.",
  "strengths": ["..."],
  "gaps": ["..."],
  "suggested_bullets": ["..."]
}"#;
