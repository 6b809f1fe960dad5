use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::features::fraud::engine::{FraudPolicy, GpsStats};

/// Reporting-period filter for fraud queries
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct FraudQuery {
    /// Restrict to a month (1-12)
    pub month: Option<i32>,
    /// Restrict to a year
    pub year: Option<i32>,
}

/// Aggregate GPS statistics plus the system-level alert condition
#[derive(Debug, Serialize, ToSchema)]
pub struct FraudSummaryDto {
    pub total: i64,
    pub with_gps: i64,
    pub valid_gps: i64,
    pub invalid_gps: i64,
    pub no_gps: i64,
    pub avg_score: f64,
    /// True when the invalid-GPS share of the period exceeds the alert ratio
    pub alert: bool,
}

impl FraudSummaryDto {
    pub fn from_stats(stats: GpsStats, policy: &FraudPolicy) -> Self {
        let alert = stats.alert_triggered(policy);
        Self {
            total: stats.total,
            with_gps: stats.with_gps,
            valid_gps: stats.valid_gps,
            invalid_gps: stats.invalid_gps,
            no_gps: stats.no_gps,
            avg_score: stats.avg_score,
            alert,
        }
    }
}
