use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::fraud::handlers;
use crate::features::fraud::services::FraudService;

/// Create protected fraud reporting routes
pub fn routes(fraud_service: Arc<FraudService>) -> Router {
    Router::new()
        .route("/api/fraud/report", get(handlers::get_fraud_report))
        .route("/api/fraud/summary", get(handlers::get_fraud_summary))
        .with_state(fraud_service)
}
