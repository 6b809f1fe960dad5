use std::sync::Arc;

use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::checklist::dtos::ChecklistEntryDto;
use crate::features::checklist::models::ChecklistEntry;
use crate::features::fraud::dtos::FraudSummaryDto;
use crate::features::fraud::engine::{self, FraudPolicy};
use crate::shared::constants::FRAUD_REPORT_LIMIT;

/// Read-only fraud reporting over persisted entries.
///
/// Runs independently of submission traffic; classification happens here
/// in memory via the engine, never in SQL, so every surface shares one
/// decision function.
pub struct FraudService {
    pool: PgPool,
    policy: Arc<FraudPolicy>,
}

impl FraudService {
    pub fn new(pool: PgPool, policy: Arc<FraudPolicy>) -> Self {
        Self { pool, policy }
    }

    /// Suspicious entries among the most recent submissions, newest first.
    pub async fn suspicious_report(&self) -> Result<Vec<ChecklistEntryDto>> {
        let entries = sqlx::query_as::<_, ChecklistEntry>(
            r#"
            SELECT id, location, day, month, year, score, photo_url, uploaded_by,
                   latitude, longitude, gps_address, photo_timestamp, is_gps_valid,
                   device_audit, device_fingerprint, created_at, updated_at,
                   approved_by, approved_at
            FROM checklist_entries
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(FRAUD_REPORT_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch entries for fraud report: {:?}", e);
            AppError::Database(e)
        })?;

        let flagged = engine::report(&entries, &self.policy);

        Ok(flagged
            .into_iter()
            .map(|(entry, _)| ChecklistEntryDto::from_entry(entry, &self.policy))
            .collect())
    }

    /// Aggregate GPS statistics for a reporting period.
    pub async fn summary(&self, month: Option<i32>, year: Option<i32>) -> Result<FraudSummaryDto> {
        let entries = sqlx::query_as::<_, ChecklistEntry>(
            r#"
            SELECT id, location, day, month, year, score, photo_url, uploaded_by,
                   latitude, longitude, gps_address, photo_timestamp, is_gps_valid,
                   device_audit, device_fingerprint, created_at, updated_at,
                   approved_by, approved_at
            FROM checklist_entries
            WHERE ($1::int IS NULL OR month = $1)
              AND ($2::int IS NULL OR year = $2)
            "#,
        )
        .bind(month)
        .bind(year)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch entries for fraud summary: {:?}", e);
            AppError::Database(e)
        })?;

        let stats = engine::aggregate(&entries);
        if stats.alert_triggered(&self.policy) {
            tracing::warn!(
                "Invalid-GPS alert: {}/{} entries failed proximity validation",
                stats.invalid_gps,
                stats.total
            );
        }

        Ok(FraudSummaryDto::from_stats(stats, &self.policy))
    }
}
