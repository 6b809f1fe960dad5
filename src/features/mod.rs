pub mod auth;
pub mod checklist;
pub mod fraud;
pub mod geo;
pub mod rate_limits;
pub mod watermark;
