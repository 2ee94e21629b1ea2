pub mod handlers;
pub mod jobs;
pub mod prompts;
pub mod render;
pub mod status;
pub mod store;
