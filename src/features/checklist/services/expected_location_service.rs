use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::checklist::dtos::UpsertExpectedLocationDto;
use crate::features::checklist::models::ExpectedLocation;
use crate::features::geo::distance::DEFAULT_PROXIMITY_TOLERANCE_M;

/// Service for the reference coordinates behind GPS validation
pub struct ExpectedLocationService {
    pool: PgPool,
}

impl ExpectedLocationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Reference for a named location, if one is configured
    pub async fn get(&self, location: &str) -> Result<Option<ExpectedLocation>> {
        sqlx::query_as::<_, ExpectedLocation>(
            r#"
            SELECT location, latitude, longitude, tolerance_m, created_at, updated_at
            FROM expected_locations
            WHERE location = $1
            "#,
        )
        .bind(location)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get expected location: {:?}", e);
            AppError::Database(e)
        })
    }

    pub async fn list(&self) -> Result<Vec<ExpectedLocation>> {
        sqlx::query_as::<_, ExpectedLocation>(
            r#"
            SELECT location, latitude, longitude, tolerance_m, created_at, updated_at
            FROM expected_locations
            ORDER BY location
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list expected locations: {:?}", e);
            AppError::Database(e)
        })
    }

    /// Create or replace the reference for a location
    pub async fn upsert(&self, data: &UpsertExpectedLocationDto) -> Result<ExpectedLocation> {
        let tolerance_m = data.tolerance_m.unwrap_or(DEFAULT_PROXIMITY_TOLERANCE_M);

        let reference = sqlx::query_as::<_, ExpectedLocation>(
            r#"
            INSERT INTO expected_locations (location, latitude, longitude, tolerance_m)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (location) DO UPDATE SET
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                tolerance_m = EXCLUDED.tolerance_m,
                updated_at = NOW()
            RETURNING location, latitude, longitude, tolerance_m, created_at, updated_at
            "#,
        )
        .bind(&data.location)
        .bind(data.latitude)
        .bind(data.longitude)
        .bind(tolerance_m)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to upsert expected location: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(
            "Expected location '{}' set to ({}, {}) ± {} m",
            reference.location,
            reference.latitude,
            reference.longitude,
            reference.tolerance_m
        );

        Ok(reference)
    }
}
