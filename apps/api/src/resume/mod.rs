// Resume upload/parse and the Application Lab fit analysis built on it.
// PDF text extraction is CPU-bound and runs inside tokio::task::spawn_blocking.

pub mod application_lab;
pub mod handlers;
pub mod parser;
pub mod prompts;
pub mod store;
