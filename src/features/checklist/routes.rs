use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;

use crate::features::checklist::feed::EntryChangeFeed;
use crate::features::checklist::handlers;
use crate::features::checklist::services::{ExpectedLocationService, SubmissionService};
use crate::features::fraud::engine::FraudPolicy;
use crate::features::rate_limits::RateLimiter;

/// Shared state for the checklist surface
#[derive(Clone)]
pub struct ChecklistState {
    pub submissions: Arc<SubmissionService>,
    pub expected_locations: Arc<ExpectedLocationService>,
    pub feed: Arc<EntryChangeFeed>,
    pub fraud_policy: Arc<FraudPolicy>,
    pub rate_limiter: Arc<dyn RateLimiter>,
}

/// Create protected checklist routes
pub fn routes(state: ChecklistState) -> Router {
    Router::new()
        .route("/api/checklist", post(handlers::submit_checklist))
        .route("/api/checklist", get(handlers::list_entries))
        .route("/api/checklist/feed", get(handlers::feed_events))
        .route("/api/checklist/{id}", get(handlers::get_entry))
        .route("/api/checklist/{id}", delete(handlers::delete_entry))
        .route(
            "/api/checklist/{id}/approve",
            patch(handlers::approve_entry),
        )
        .route(
            "/api/expected-locations",
            get(handlers::list_expected_locations),
        )
        .route(
            "/api/expected-locations",
            put(handlers::upsert_expected_location),
        )
        .with_state(state)
}
