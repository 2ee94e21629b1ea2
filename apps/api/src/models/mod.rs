pub mod calendar;
pub mod contact;
pub mod prep;
pub mod resume;
pub mod user;
