//! Prep documents and their markdown rendering.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoffeeChatDoc {
    #[serde(default)]
    pub contact_summary: String,
    #[serde(default)]
    pub company_overview: String,
    #[serde(default)]
    pub recent_news: Vec<String>,
    #[serde(default)]
    pub talking_points: Vec<String>,
    #[serde(default)]
    pub questions_to_ask: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikelyQuestion {
    pub question: String,
    #[serde(default)]
    pub tip: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterviewDoc {
    #[serde(default)]
    pub company_overview: String,
    #[serde(default)]
    pub role_summary: String,
    #[serde(default)]
    pub interview_process: Vec<String>,
    #[serde(default)]
    pub likely_questions: Vec<LikelyQuestion>,
    #[serde(default)]
    pub preparation_tips: Vec<String>,
}

fn push_paragraph(md: &mut String, heading: &str, body: &str) {
    let body = body.trim();
    if body.is_empty() {
        return;
    }
    md.push_str(&format!("## {heading}\n\n{body}\n\n"));
}

fn push_list(md: &mut String, heading: &str, items: &[String], numbered: bool) {
    let items: Vec<&str> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        return;
    }
    md.push_str(&format!("## {heading}\n\n"));
    for (i, item) in items.iter().enumerate() {
        if numbered {
            md.push_str(&format!("{}. {item}\n", i + 1));
        } else {
            md.push_str(&format!("- {item}\n"));
        }
    }
    md.push('\n');
}

pub fn render_coffee_chat(contact_name: &str, company: &str, doc: &CoffeeChatDoc) -> String {
    let mut md = format!("# Coffee Chat Prep: {contact_name} ({company})\n\n");
    push_paragraph(&mut md, "About the Contact", &doc.contact_summary);
    push_paragraph(&mut md, "Company Overview", &doc.company_overview);
    push_list(&mut md, "Recent News", &doc.recent_news, false);
    push_list(&mut md, "Talking Points", &doc.talking_points, false);
    push_list(&mut md, "Questions to Ask", &doc.questions_to_ask, true);
    md
}

pub fn render_interview(company: &str, job_title: &str, doc: &InterviewDoc) -> String {
    let mut md = format!("# Interview Prep: {job_title} at {company}\n\n");
    push_paragraph(&mut md, "Company Overview", &doc.company_overview);
    push_paragraph(&mut md, "The Role", &doc.role_summary);
    push_list(&mut md, "Interview Process", &doc.interview_process, true);

    let questions: Vec<&LikelyQuestion> = doc
        .likely_questions
        .iter()
        .filter(|q| !q.question.trim().is_empty())
        .collect();
    if !questions.is_empty() {
        md.push_str("## Likely Questions\n\n");
        for q in questions {
            md.push_str(&format!("### {}\n", q.question.trim()));
            if let Some(tip) = q.tip.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                md.push_str(&format!("{tip}\n"));
            }
            md.push('\n');
        }
    }

    push_list(&mut md, "Preparation Tips", &doc.preparation_tips, false);
    md
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coffee_chat_sections_in_order() {
        let doc = CoffeeChatDoc {
            contact_summary: "VP in the TMT group.".to_string(),
            company_overview: "Boutique advisory firm.".to_string(),
            recent_news: vec![],
            talking_points: vec!["Ask about the Michigan pipeline".to_string()],
            questions_to_ask: vec!["What surprised you?".to_string(), "Any advice?".to_string()],
        };
        let md = render_coffee_chat("Jane Doe", "Evercore", &doc);

        assert!(md.starts_with("# Coffee Chat Prep: Jane Doe (Evercore)"));
        assert!(!md.contains("## Recent News"));
        let about = md.find("## About the Contact").unwrap();
        let questions = md.find("## Questions to Ask").unwrap();
        assert!(about < questions);
        assert!(md.contains("2. Any advice?"));
    }

    #[test]
    fn test_interview_renders_question_tips() {
        let doc: InterviewDoc = serde_json::from_str(
            r#"{"company_overview": "Bank.",
                "likely_questions": [
                    {"question": "Walk me through a DCF", "tip": "Start from unlevered FCF"},
                    {"question": "  "},
                    {"question": "Why us?"}
                ]}"#,
        )
        .unwrap();
        let md = render_interview("Goldman Sachs", "Analyst", &doc);

        assert!(md.contains("### Walk me through a DCF\nStart from unlevered FCF\n"));
        assert!(md.contains("### Why us?\n\n"));
        assert_eq!(md.matches("### ").count(), 2);
        assert!(!md.contains("## The Role"));
    }
}
