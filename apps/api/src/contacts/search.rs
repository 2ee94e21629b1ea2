//! Contact search run.
//!
//! Flow: validate → charge (per requested contact) → People Data Labs search →
//!       dedup against saved contacts → draft emails → save → refund the shortfall.
//!
//! Credits are taken up front. Contacts that could not be delivered are refunded,
//! and a run that fails outright is refunded in full. A save error partway through
//! keeps the contacts already saved and refunds the rest.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::billing::store as billing;
use crate::billing::tier::Feature;
use crate::contacts::dedup::{select_new_people, title_case};
use crate::contacts::emails::{draft_emails, EmailTarget, SenderProfile};
use crate::contacts::store::{self, NewContact};
use crate::errors::AppError;
use crate::integrations::people_data::{PdlPerson, PersonQuery};
use crate::models::contact::{ContactRow, OutreachStatus};
use crate::resume;
use crate::state::AppState;

pub const MAX_CONTACTS_PER_SEARCH: u32 = 15;
/// PDL is asked for extra rows so dedup still leaves enough to fill the request.
const OVERFETCH_FACTOR: u32 = 2;
const MAX_PDL_PAGE: u32 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub job_title: String,
    pub company: Option<String>,
    pub location: String,
    pub college: Option<String>,
    pub max_contacts: u32,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub contacts: Vec<ContactRow>,
    pub requested: u32,
    pub credits_charged: i32,
    pub credits_refunded: i32,
    pub credits_remaining: i32,
}

impl SearchRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.job_title.trim().is_empty() {
            return Err(AppError::Validation("job_title cannot be empty".to_string()));
        }
        if self.location.trim().is_empty() {
            return Err(AppError::Validation("location cannot be empty".to_string()));
        }
        if !(1..=MAX_CONTACTS_PER_SEARCH).contains(&self.max_contacts) {
            return Err(AppError::Validation(format!(
                "max_contacts must be between 1 and {MAX_CONTACTS_PER_SEARCH}"
            )));
        }
        Ok(())
    }

    fn college(&self) -> Option<&str> {
        self.college.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    /// Alumni search when a college filter is present, plain contact search otherwise.
    pub fn feature(&self) -> Feature {
        if self.college().is_some() {
            Feature::AlumniSearch
        } else {
            Feature::ContactSearch
        }
    }

    pub fn cost(&self) -> u32 {
        self.feature().unit_cost().unsigned_abs() * self.max_contacts
    }

    /// Credits owed back once `delivered` contacts have been saved.
    pub fn refund_due(&self, delivered: usize) -> u32 {
        let delivered = u32::try_from(delivered).unwrap_or(u32::MAX);
        self.feature().unit_cost().unsigned_abs() * self.max_contacts.saturating_sub(delivered)
    }
}

pub async fn run_search(
    state: &AppState,
    uid: &str,
    request: SearchRequest,
) -> Result<SearchResponse, AppError> {
    request.validate()?;
    let feature = request.feature();
    let cost = request.cost();

    let charge = billing::charge(
        &state.db,
        uid,
        feature,
        cost,
        Some(&format!("{} x{}", request.job_title.trim(), request.max_contacts)),
    )
    .await?;

    let contacts = match find_and_save(state, uid, &request).await {
        Ok(contacts) => contacts,
        Err(e) => {
            let due = request.refund_due(0);
            billing::refund_quietly(&state.db, uid, feature, due, "search failed").await;
            return Err(e);
        }
    };

    let due = request.refund_due(contacts.len());
    let refunded = if due > 0 {
        billing::refund_quietly(&state.db, uid, feature, due, "undelivered contacts").await
    } else {
        0
    };

    info!(
        "Search for user {uid} delivered {}/{} contacts",
        contacts.len(),
        request.max_contacts
    );

    Ok(SearchResponse {
        requested: request.max_contacts,
        credits_charged: charge.cost,
        credits_refunded: refunded,
        credits_remaining: charge.balance_after + refunded,
        contacts,
    })
}

async fn find_and_save(
    state: &AppState,
    uid: &str,
    request: &SearchRequest,
) -> Result<Vec<ContactRow>, AppError> {
    let query = PersonQuery {
        job_title: request.job_title.trim().to_string(),
        company: request.company.clone(),
        location: request.location.trim().to_string(),
        college: request.college().map(str::to_string),
        size: (request.max_contacts * OVERFETCH_FACTOR).min(MAX_PDL_PAGE),
    };
    let people = state.people.search(&query).await?;

    let existing = store::existing_emails(&state.db, uid).await?;
    let max = usize::try_from(request.max_contacts).unwrap_or(usize::MAX);
    let picked = select_new_people(people, &existing, max);
    if picked.is_empty() {
        return Ok(vec![]);
    }

    let new_contacts: Vec<NewContact> = picked
        .iter()
        .map(|p| to_new_contact(p, request.college()))
        .collect();

    let sender = sender_profile(state, uid).await;
    let targets: Vec<EmailTarget> = new_contacts.iter().map(to_email_target).collect();
    let drafts = match draft_emails(&state.llm, &sender, &targets).await {
        Ok(drafts) => drafts,
        Err(e) => {
            warn!("Saving contacts without drafts for user {uid}: {e}");
            vec![None; targets.len()]
        }
    };

    let mut saved = Vec::with_capacity(new_contacts.len());
    for (mut contact, draft) in new_contacts.into_iter().zip(drafts) {
        let status = match draft {
            Some(email) => {
                contact.email_subject = Some(email.subject);
                contact.email_body = Some(email.body);
                OutreachStatus::Drafted
            }
            None => OutreachStatus::NotContacted,
        };
        match store::insert(&state.db, uid, &contact, status).await {
            Ok(row) => saved.push(row),
            Err(AppError::Conflict(msg)) => warn!("Skipping contact saved concurrently: {msg}"),
            Err(e) if saved.is_empty() => return Err(e),
            Err(e) => {
                warn!("Stopping after {} saved contacts for user {uid}: {e}", saved.len());
                break;
            }
        }
    }
    Ok(saved)
}

fn to_new_contact(person: &PdlPerson, college: Option<&str>) -> NewContact {
    let name = |v: &Option<String>| title_case(v.as_deref().unwrap_or_default());
    NewContact {
        first_name: name(&person.first_name),
        last_name: name(&person.last_name),
        email: person.best_email().map(str::to_string),
        company: person.job_company_name.as_deref().map(title_case),
        job_title: person.job_title.as_deref().map(title_case),
        location: person.location_name.as_deref().map(title_case),
        college: college
            .and_then(|c| person.matching_school(c))
            .map(title_case),
        linkedin_url: person.linkedin_url.as_deref().map(|u| {
            if u.starts_with("http") {
                u.to_string()
            } else {
                format!("https://{u}")
            }
        }),
        email_subject: None,
        email_body: None,
        notes: None,
    }
}

fn to_email_target(contact: &NewContact) -> EmailTarget {
    EmailTarget {
        first_name: contact.first_name.clone(),
        last_name: contact.last_name.clone(),
        company: contact.company.clone(),
        job_title: contact.job_title.clone(),
        location: contact.location.clone(),
        college: contact.college.clone(),
    }
}

/// Sender details from the stored resume; an absent or unreadable resume yields a blank profile.
async fn sender_profile(state: &AppState, uid: &str) -> SenderProfile {
    match resume::store::find_parsed(&state.db, uid).await {
        Ok(Some(parsed)) => SenderProfile {
            name: parsed.name,
            school: parsed.school,
            major: parsed.major,
            headline: parsed.headline,
        },
        Ok(None) => SenderProfile::default(),
        Err(e) => {
            warn!("Could not load resume for user {uid}: {e}");
            SenderProfile::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn request(college: Option<&str>, max_contacts: u32) -> SearchRequest {
        SearchRequest {
            job_title: "Investment Banking Analyst".to_string(),
            company: None,
            location: "New York".to_string(),
            college: college.map(str::to_string),
            max_contacts,
        }
    }

    #[test]
    fn test_college_switches_to_alumni_search() {
        assert_eq!(request(None, 3).feature(), Feature::ContactSearch);
        assert_eq!(request(Some("  "), 3).feature(), Feature::ContactSearch);
        assert_eq!(request(Some("Michigan"), 3).feature(), Feature::AlumniSearch);
    }

    #[test]
    fn test_cost_scales_with_requested_contacts() {
        assert_eq!(request(None, 4).cost(), 60);
    }

    #[rstest]
    #[case(None, 5, 2, 45)]
    #[case(None, 5, 0, 75)]
    #[case(None, 5, 5, 0)]
    #[case(None, 5, 9, 0)]
    #[case(Some("Michigan"), 3, 1, 30)]
    fn test_refund_due_covers_undelivered_contacts(
        #[case] college: Option<&str>,
        #[case] max_contacts: u32,
        #[case] delivered: usize,
        #[case] expected: u32,
    ) {
        let search = request(college, max_contacts);
        assert_eq!(search.refund_due(delivered), expected);
        assert!(search.refund_due(delivered) <= search.cost());
    }

    #[test]
    fn test_validate_bounds() {
        assert!(request(None, 0).validate().is_err());
        assert!(request(None, 16).validate().is_err());
        assert!(request(None, 15).validate().is_ok());
        let mut blank = request(None, 1);
        blank.location = " ".to_string();
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_to_new_contact_formats_fields() {
        let person = PdlPerson {
            first_name: Some("jane".to_string()),
            last_name: Some("doe".to_string()),
            work_email: Some("jane@evercore.com".to_string()),
            job_company_name: Some("evercore".to_string()),
            linkedin_url: Some("linkedin.com/in/janedoe".to_string()),
            ..Default::default()
        };
        let contact = to_new_contact(&person, None);
        assert_eq!(contact.first_name, "Jane");
        assert_eq!(contact.company.as_deref(), Some("Evercore"));
        assert_eq!(
            contact.linkedin_url.as_deref(),
            Some("https://linkedin.com/in/janedoe")
        );
        assert!(contact.college.is_none());
    }
}
