// Contacts: the user's outreach pipeline, plus the search run that finds new
// people through People Data Labs and drafts an email for each.

pub mod dedup;
pub mod emails;
pub mod handlers;
pub mod prompts;
pub mod search;
pub mod store;
