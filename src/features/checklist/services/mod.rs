mod expected_location_service;
mod submission_service;

pub use expected_location_service::ExpectedLocationService;
pub use submission_service::{parse_photo_timestamp, SubmissionRequest, SubmissionService};
