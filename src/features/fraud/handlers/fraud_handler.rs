use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::checklist::dtos::ChecklistEntryDto;
use crate::features::fraud::dtos::{FraudQuery, FraudSummaryDto};
use crate::features::fraud::services::FraudService;
use crate::shared::types::{ApiResponse, Meta};

/// Suspicious uploads among the most recent submissions
#[utoipa::path(
    get,
    path = "/api/fraud/report",
    tag = "fraud",
    responses(
        (status = 200, description = "Suspicious entries with derived flags", body = ApiResponse<Vec<ChecklistEntryDto>>),
        (status = 403, description = "Supervisor access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_fraud_report(
    user: AuthenticatedUser,
    State(service): State<Arc<FraudService>>,
) -> Result<Json<ApiResponse<Vec<ChecklistEntryDto>>>, AppError> {
    if !user.has_supervisor_access() {
        return Err(AppError::Forbidden(
            "Supervisor access required".to_string(),
        ));
    }

    let flagged = service.suspicious_report().await?;
    let total = flagged.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(flagged),
        None,
        Some(Meta { total }),
    )))
}

/// Aggregate GPS statistics for a reporting period
#[utoipa::path(
    get,
    path = "/api/fraud/summary",
    tag = "fraud",
    params(FraudQuery),
    responses(
        (status = 200, description = "Aggregate statistics and alert state", body = ApiResponse<FraudSummaryDto>),
        (status = 403, description = "Supervisor access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_fraud_summary(
    user: AuthenticatedUser,
    State(service): State<Arc<FraudService>>,
    Query(query): Query<FraudQuery>,
) -> Result<Json<ApiResponse<FraudSummaryDto>>, AppError> {
    if !user.has_supervisor_access() {
        return Err(AppError::Forbidden(
            "Supervisor access required".to_string(),
        ));
    }

    if let Some(month) = query.month {
        if !(1..=12).contains(&month) {
            return Err(AppError::Validation(format!("Invalid month: {}", month)));
        }
    }

    let summary = service.summary(query.month, query.year).await?;
    Ok(Json(ApiResponse::success(Some(summary), None, None)))
}
