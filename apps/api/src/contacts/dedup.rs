use std::collections::HashSet;

use crate::integrations::people_data::PdlPerson;

/// Canonical form used for uniqueness-by-email.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Picks at most `max` people worth saving: they need a name and a usable email,
/// and must not already be among the user's contacts or earlier in the batch.
pub fn select_new_people(
    people: Vec<PdlPerson>,
    existing_emails: &HashSet<String>,
    max: usize,
) -> Vec<PdlPerson> {
    let mut seen: HashSet<String> = HashSet::new();
    people
        .into_iter()
        .filter(|p| has_name(p))
        .filter(|p| match p.best_email() {
            Some(email) => {
                let key = normalize_email(email);
                !existing_emails.contains(&key) && seen.insert(key)
            }
            None => false,
        })
        .take(max)
        .collect()
}

fn has_name(person: &PdlPerson) -> bool {
    let filled = |v: &Option<String>| v.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false);
    filled(&person.first_name) && filled(&person.last_name)
}

/// People Data Labs returns names lower-cased; restore capitalisation per word.
pub fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            word.split('-')
                .map(|part| {
                    let mut chars = part.chars();
                    match chars.next() {
                        None => String::new(),
                        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    }
                })
                .collect::<Vec<_>>()
                .join("-")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(first: &str, last: &str, email: Option<&str>) -> PdlPerson {
        PdlPerson {
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
            work_email: email.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_existing_contacts_are_skipped() {
        let existing: HashSet<String> = ["jane@acme.com".to_string()].into_iter().collect();
        let picked = select_new_people(
            vec![
                person("jane", "doe", Some("Jane@Acme.com ")),
                person("john", "roe", Some("john@acme.com")),
            ],
            &existing,
            5,
        );
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].first_name.as_deref(), Some("john"));
    }

    #[test]
    fn test_batch_duplicates_and_missing_emails_dropped() {
        let picked = select_new_people(
            vec![
                person("a", "one", Some("a@x.com")),
                person("a", "again", Some("A@X.COM")),
                person("b", "two", None),
                person("", "three", Some("c@x.com")),
            ],
            &HashSet::new(),
            5,
        );
        assert_eq!(picked.len(), 1);
    }

    #[test]
    fn test_selection_respects_max() {
        let people = (0..10)
            .map(|i| person("p", "q", Some(&format!("p{i}@x.com"))))
            .collect();
        assert_eq!(select_new_people(people, &HashSet::new(), 3).len(), 3);
    }

    #[test]
    fn test_title_case_handles_hyphens() {
        assert_eq!(title_case("mary-kate o'neil"), "Mary-Kate O'neil");
        assert_eq!(title_case("  jose   garcia "), "Jose Garcia");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Foo@Bar.COM "), "foo@bar.com");
    }
}
