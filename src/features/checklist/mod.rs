pub mod dtos;
pub mod feed;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use feed::EntryChangeFeed;
pub use routes::ChecklistState;
pub use services::{ExpectedLocationService, SubmissionService};
