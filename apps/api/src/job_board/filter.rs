//! Job board scoring and filtering.
//!
//! Keyword fit between a Google Jobs posting and the user's profile:
//! 1. Profile keywords are the search query terms (weight 2.0) and resume skills (weight 1.0).
//! 2. Each keyword scores 1.0 when it appears in the job title, 0.6 when only in the
//!    description, 0.0 otherwise.
//! 3. Query coverage is the weighted mean over query terms. Skill coverage saturates
//!    after a handful of matched skills, so a long skill list cannot drown the query.
//! 4. score = 100 × (0.7 × query + 0.3 × skills), or 100 × query with no skills.

use std::collections::HashMap;

use serde::Serialize;

use crate::integrations::serp::JobListing;

pub const QUALITY_THRESHOLD: u32 = 40;
pub const DEFAULT_MAX_AGE_DAYS: u32 = 30;

const QUERY_WEIGHT: f32 = 2.0;
const SKILL_WEIGHT: f32 = 1.0;
const TITLE_STRENGTH: f32 = 1.0;
const DESCRIPTION_STRENGTH: f32 = 0.6;
const SKILL_SATURATION: f32 = 5.0;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "at", "for", "in", "of", "on", "or", "the", "to", "with", "job", "jobs",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordSource {
    Query,
    Skill,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileKeyword {
    pub keyword: String,
    pub source: KeywordSource,
    pub weight: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredJob {
    #[serde(flatten)]
    pub job: JobListing,
    pub score: u32,
    /// `None` when the posting carries no usable date.
    pub age_days: Option<u32>,
}

/// Query terms first, then resume skills; duplicates keep their first (query) entry.
pub fn profile_keywords(query: &str, skills: &[String]) -> Vec<ProfileKeyword> {
    let mut keywords: Vec<ProfileKeyword> = Vec::new();
    let mut push = |keyword: String, source: KeywordSource, weight: f32| {
        if !keyword.is_empty() && !keywords.iter().any(|k| k.keyword == keyword) {
            keywords.push(ProfileKeyword {
                keyword,
                source,
                weight,
            });
        }
    };

    let terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric() && c != '+' && c != '#')
        .map(str::to_lowercase)
        .filter(|t| t.len() >= 2 && !STOPWORDS.contains(&t.as_str()))
        .collect();
    if terms.is_empty() {
        push(query.trim().to_lowercase(), KeywordSource::Query, QUERY_WEIGHT);
    }
    for term in terms {
        push(term, KeywordSource::Query, QUERY_WEIGHT);
    }
    for skill in skills {
        push(skill.trim().to_lowercase(), KeywordSource::Skill, SKILL_WEIGHT);
    }
    keywords
}

fn keyword_strength(keyword: &str, title: &str, description: &str) -> f32 {
    if title.contains(keyword) {
        TITLE_STRENGTH
    } else if description.contains(keyword) {
        DESCRIPTION_STRENGTH
    } else {
        0.0
    }
}

/// Fit of one posting against the profile, 0–100.
pub fn score_job(job: &JobListing, keywords: &[ProfileKeyword]) -> u32 {
    let title = job.title.to_lowercase();
    let description = job.description.as_deref().unwrap_or_default().to_lowercase();

    let mut query_total = 0.0_f32;
    let mut query_weight = 0.0_f32;
    let mut skill_total = 0.0_f32;
    let mut has_skills = false;

    for kw in keywords {
        let strength = keyword_strength(&kw.keyword, &title, &description);
        match kw.source {
            KeywordSource::Query => {
                query_total += strength * kw.weight;
                query_weight += kw.weight;
            }
            KeywordSource::Skill => {
                has_skills = true;
                skill_total += strength * kw.weight;
            }
        }
    }

    let query = if query_weight > 0.0 {
        query_total / query_weight
    } else {
        0.0
    };
    let combined = if has_skills {
        let skills = (skill_total / (SKILL_SATURATION * SKILL_WEIGHT)).min(1.0);
        0.7 * query + 0.3 * skills
    } else {
        query
    };
    (combined * 100.0).round().clamp(0.0, 100.0) as u32
}

/// Age in days from Google Jobs' relative `posted_at` text ("3 days ago", "30+ days ago").
pub fn parse_posted_age_days(posted_at: &str) -> Option<u32> {
    let text = posted_at.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }
    if text.contains("just") || text == "today" {
        return Some(0);
    }

    let mut words = text.split_whitespace();
    let amount = words.next()?;
    let unit = words.next()?;
    let amount: u32 = match amount.trim_end_matches('+') {
        "a" | "an" => 1,
        n if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) => {
            n.parse().unwrap_or(u32::MAX)
        }
        _ => return None,
    };

    let unit = unit.trim_end_matches('s');
    match unit {
        "second" | "minute" | "hour" => Some(0),
        "day" => Some(amount),
        "week" => Some(amount.saturating_mul(7)),
        "month" => Some(amount.saturating_mul(30)),
        "year" => Some(amount.saturating_mul(365)),
        _ => None,
    }
}

/// Scores, filters, deduplicates and orders raw postings.
pub fn filter_jobs(
    jobs: Vec<JobListing>,
    keywords: &[ProfileKeyword],
    max_age_days: u32,
) -> Vec<ScoredJob> {
    let mut best: HashMap<(String, String), ScoredJob> = HashMap::new();

    for job in jobs {
        let age_days = job
            .detected_extensions
            .posted_at
            .as_deref()
            .and_then(parse_posted_age_days);
        if matches!(age_days, Some(age) if age > max_age_days) {
            continue;
        }
        let score = score_job(&job, keywords);
        if score < QUALITY_THRESHOLD {
            continue;
        }

        let key = (
            job.title.trim().to_lowercase(),
            job.company_name.trim().to_lowercase(),
        );
        let candidate = ScoredJob {
            job,
            score,
            age_days,
        };
        match best.get(&key) {
            Some(existing) if existing.score >= candidate.score => {}
            _ => {
                best.insert(key, candidate);
            }
        }
    }

    let mut jobs: Vec<ScoredJob> = best.into_values().collect();
    jobs.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.age_days.unwrap_or(u32::MAX).cmp(&b.age_days.unwrap_or(u32::MAX)))
            .then_with(|| a.job.title.cmp(&b.job.title))
    });
    jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::serp::JobExtensions;
    use rstest::rstest;

    fn job(title: &str, company: &str, description: &str, posted_at: Option<&str>) -> JobListing {
        JobListing {
            title: title.to_string(),
            company_name: company.to_string(),
            location: None,
            description: Some(description.to_string()),
            job_id: None,
            detected_extensions: JobExtensions {
                posted_at: posted_at.map(str::to_string),
                schedule_type: None,
            },
            apply_options: vec![],
        }
    }

    #[rstest]
    #[case("just posted", Some(0))]
    #[case("5 hours ago", Some(0))]
    #[case("a day ago", Some(1))]
    #[case("3 days ago", Some(3))]
    #[case("30+ days ago", Some(30))]
    #[case("2 weeks ago", Some(14))]
    #[case("1 month ago", Some(30))]
    #[case("99999999 years ago", Some(u32::MAX))]
    #[case("99999999999 days ago", Some(u32::MAX))]
    #[case("Full-time", None)]
    #[case("", None)]
    fn test_parse_posted_age_days(#[case] text: &str, #[case] expected: Option<u32>) {
        assert_eq!(parse_posted_age_days(text), expected);
    }

    #[test]
    fn test_profile_keywords_drop_stopwords_and_duplicates() {
        let keywords = profile_keywords(
            "Analyst jobs in Finance",
            &["Finance".to_string(), "Excel".to_string()],
        );
        let words: Vec<&str> = keywords.iter().map(|k| k.keyword.as_str()).collect();
        assert_eq!(words, vec!["analyst", "finance", "excel"]);
        assert_eq!(keywords[1].source, KeywordSource::Query);
        assert_eq!(keywords[2].source, KeywordSource::Skill);
    }

    #[test]
    fn test_title_match_outscores_description_match() {
        let keywords = profile_keywords("data analyst", &[]);
        let in_title = score_job(&job("Data Analyst", "Acme", "", None), &keywords);
        let in_description = score_job(
            &job("Associate", "Acme", "You will be a data analyst", None),
            &keywords,
        );
        assert_eq!(in_title, 100);
        assert_eq!(in_description, 60);
    }

    #[test]
    fn test_long_skill_list_does_not_sink_query_match() {
        let skills: Vec<String> = (0..30).map(|i| format!("skill{i}")).collect();
        let keywords = profile_keywords("software engineer", &skills);
        let score = score_job(&job("Software Engineer", "Acme", "", None), &keywords);
        assert_eq!(score, 70);
        assert!(score >= QUALITY_THRESHOLD);
    }

    #[test]
    fn test_filter_drops_low_scores_and_stale_postings() {
        let keywords = profile_keywords("rust engineer", &[]);
        let jobs = vec![
            job("Rust Engineer", "Acme", "", Some("2 days ago")),
            job("Rust Engineer", "Old Co", "", Some("30+ days ago")),
            job("Rust Engineer", "Ancient Co", "", Some("2 months ago")),
            job("Barista", "Cafe", "coffee", Some("1 day ago")),
        ];
        let kept = filter_jobs(jobs, &keywords, 30);
        let companies: Vec<&str> = kept.iter().map(|j| j.job.company_name.as_str()).collect();
        assert_eq!(companies, vec!["Acme", "Old Co"]);
    }

    #[test]
    fn test_huge_ages_are_filtered_as_stale() {
        let keywords = profile_keywords("rust engineer", &[]);
        let jobs = vec![
            job("Rust Engineer", "Fresh", "", Some("1 day ago")),
            job("Rust Engineer", "Huge", "", Some("99999999 years ago")),
        ];
        let kept = filter_jobs(jobs, &keywords, 30);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].job.company_name, "Fresh");
    }

    #[test]
    fn test_undated_postings_are_kept_and_sorted_last_among_equals() {
        let keywords = profile_keywords("rust engineer", &[]);
        let jobs = vec![
            job("Rust Engineer", "Undated", "", None),
            job("Rust Engineer", "Fresh", "", Some("1 day ago")),
        ];
        let kept = filter_jobs(jobs, &keywords, 7);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].job.company_name, "Fresh");
        assert_eq!(kept[1].age_days, None);
    }

    #[test]
    fn test_dedup_by_title_and_company_keeps_best() {
        let keywords = profile_keywords("rust engineer", &[]);
        let jobs = vec![
            job("Senior Engineer", "Acme", "rust", Some("1 day ago")),
            job("rust engineer", "ACME", "", Some("3 days ago")),
            job("Rust Engineer", "Acme", "", Some("1 day ago")),
        ];
        let kept = filter_jobs(jobs, &keywords, 30);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].score, 100);
        assert_eq!(kept[0].age_days, Some(3));
    }

    #[test]
    fn test_sort_by_score_then_recency() {
        let keywords = profile_keywords("rust engineer", &[]);
        let jobs = vec![
            job("Engineer", "A", "rust", Some("1 day ago")),
            job("Rust Engineer", "B", "", Some("9 days ago")),
            job("Rust Engineer", "C", "", Some("2 days ago")),
        ];
        let kept = filter_jobs(jobs, &keywords, 30);
        let order: Vec<&str> = kept.iter().map(|j| j.job.company_name.as_str()).collect();
        assert_eq!(order, vec!["C", "B", "A"]);
    }
}
