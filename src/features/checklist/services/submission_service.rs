use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::checklist::dtos::{ChecklistEntryDto, SubmitChecklistForm};
use crate::features::checklist::feed::{EntryChangeFeed, EntryEvent};
use crate::features::checklist::models::{ChecklistEntry, DeviceAudit};
use crate::features::checklist::services::ExpectedLocationService;
use crate::features::fraud::engine::FraudPolicy;
use crate::features::geo::{
    distance, Coordinate, CoordinateAcquirer, PositionFix, ReverseGeocodeService,
};
use crate::features::watermark::{WatermarkCompositor, WatermarkSpec};
use crate::modules::storage::MinIOClient;
use crate::shared::constants::ADDRESS_PENDING;

const ALL_COLUMNS: &str = "id, location, day, month, year, score, photo_url, uploaded_by, \
     latitude, longitude, gps_address, photo_timestamp, is_gps_valid, \
     device_audit, device_fingerprint, created_at, updated_at, approved_by, approved_at";

/// Assembles and persists checklist submissions.
///
/// One submission is one pipeline run: acquire position, composite the
/// watermark, upload the artifact, then a single atomic upsert. A failure
/// before the upsert leaves no partial record behind.
pub struct SubmissionService {
    pool: PgPool,
    storage: Arc<MinIOClient>,
    compositor: Arc<WatermarkCompositor>,
    geocoder: Arc<ReverseGeocodeService>,
    acquirer: Arc<CoordinateAcquirer>,
    expected_locations: Arc<ExpectedLocationService>,
    feed: Arc<EntryChangeFeed>,
    fraud_policy: Arc<FraudPolicy>,
}

/// One parsed submission ready to run through the pipeline
pub struct SubmissionRequest {
    pub photo: Vec<u8>,
    pub content_type: String,
    pub form: SubmitChecklistForm,
}

impl SubmissionService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: PgPool,
        storage: Arc<MinIOClient>,
        compositor: Arc<WatermarkCompositor>,
        geocoder: Arc<ReverseGeocodeService>,
        acquirer: Arc<CoordinateAcquirer>,
        expected_locations: Arc<ExpectedLocationService>,
        feed: Arc<EntryChangeFeed>,
        fraud_policy: Arc<FraudPolicy>,
    ) -> Self {
        Self {
            pool,
            storage,
            compositor,
            geocoder,
            acquirer,
            expected_locations,
            feed,
            fraud_policy,
        }
    }

    /// Run the full submission pipeline for an authenticated actor.
    pub async fn submit(
        &self,
        uploaded_by: &str,
        request: SubmissionRequest,
    ) -> Result<ChecklistEntry> {
        let form = &request.form;

        let coord = self.resolve_coordinate(form).await?;

        // The watermark waits only on the coordinate, never on the
        // reverse-geocoded address
        let spec = WatermarkSpec {
            location: form.location.clone(),
            timestamp: Utc::now(),
            coords: coord,
        };
        let stamped = self.compositor.compose(&request.photo, &spec)?;

        let (photo_key, photo_url) = self
            .upload_photo(&form.location, stamped, &request.content_type)
            .await?;

        let is_gps_valid = self.evaluate_proximity(&form.location, coord).await?;

        let device_audit = form.device.clone().map(|d| d.into_audit());
        let upserted = self
            .upsert_entry(
                form,
                uploaded_by,
                &photo_url,
                coord,
                is_gps_valid,
                device_audit,
            )
            .await;

        let entry = match upserted {
            Ok(entry) => entry,
            Err(e) => {
                // No row was written; drop the orphaned photo as well so a
                // failed submission leaves nothing behind
                if let Err(cleanup) = self.storage.delete(&photo_key).await {
                    tracing::warn!("Failed to clean up photo '{}': {}", photo_key, cleanup);
                }
                return Err(e);
            }
        };

        // created_at survives the conflict update, so equality with
        // updated_at distinguishes a fresh slot from a replacement
        let event = if entry.created_at == entry.updated_at {
            EntryEvent::Inserted {
                entry: ChecklistEntryDto::from_entry(&entry, &self.fraud_policy),
            }
        } else {
            EntryEvent::Updated {
                entry: ChecklistEntryDto::from_entry(&entry, &self.fraud_policy),
            }
        };
        self.feed.publish(event);

        if let Some(coord) = coord {
            self.spawn_address_resolution(entry.id, coord);
        }

        tracing::info!(
            "Checklist entry {} persisted for slot ({}, {:02}-{:02}-{})",
            entry.id,
            entry.location,
            entry.day,
            entry.month,
            entry.year
        );

        Ok(entry)
    }

    /// Client fix when supplied, otherwise one bounded acquisition attempt.
    async fn resolve_coordinate(&self, form: &SubmitChecklistForm) -> Result<Option<Coordinate>> {
        match (form.latitude, form.longitude) {
            (Some(lat), Some(lon)) => {
                let coord = Coordinate::new(lat, lon);
                if !coord.is_valid() {
                    return Err(AppError::Validation(format!(
                        "Coordinates out of range: {}, {}",
                        lat, lon
                    )));
                }
                Ok(Some(coord))
            }
            (None, None) => Ok(match self.acquirer.acquire().await {
                PositionFix::Fix(coord) => Some(coord),
                PositionFix::Unavailable => None,
            }),
            _ => Err(AppError::Validation(
                "latitude and longitude must be provided together".to_string(),
            )),
        }
    }

    /// Returns (object key, public URL)
    async fn upload_photo(
        &self,
        location: &str,
        stamped: Vec<u8>,
        content_type: &str,
    ) -> Result<(String, String)> {
        let extension = match content_type {
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "jpg",
        };
        let slug = location.to_lowercase().replace(' ', "-");
        let path = format!("checklist/{}/{}.{}", slug, Uuid::new_v4(), extension);
        let key = self.storage.generate_public_key(&path);

        self.storage.upload(&key, stamped, content_type).await?;
        let url = self.storage.get_public_url(&key);
        Ok((key, url))
    }

    /// Proximity verdict against the configured reference, or None when the
    /// location has no reference ("not evaluated", distinct from "failed").
    async fn evaluate_proximity(
        &self,
        location: &str,
        coord: Option<Coordinate>,
    ) -> Result<Option<bool>> {
        let Some(coord) = coord else {
            return Ok(None);
        };
        let Some(reference) = self.expected_locations.get(location).await? else {
            return Ok(None);
        };

        let check =
            distance::validate_proximity(&coord, &reference.coordinate(), reference.tolerance_m);
        if !check.valid {
            tracing::warn!("GPS mismatch for '{}': {}", location, check.message);
        }
        Ok(Some(check.valid))
    }

    async fn upsert_entry(
        &self,
        form: &SubmitChecklistForm,
        uploaded_by: &str,
        photo_url: &str,
        coord: Option<Coordinate>,
        is_gps_valid: Option<bool>,
        device_audit: Option<DeviceAudit>,
    ) -> Result<ChecklistEntry> {
        let device_fingerprint = device_audit.as_ref().map(|d| d.fingerprint());
        // Placeholder until the spawned reverse-geocode task replaces it
        let gps_address = coord.map(|_| ADDRESS_PENDING.to_string());

        let sql = format!(
            r#"
            INSERT INTO checklist_entries (
                id, location, day, month, year, score, photo_url, uploaded_by,
                latitude, longitude, gps_address, photo_timestamp, is_gps_valid,
                device_audit, device_fingerprint
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (location, day, month, year) DO UPDATE SET
                score = EXCLUDED.score,
                photo_url = EXCLUDED.photo_url,
                uploaded_by = EXCLUDED.uploaded_by,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                gps_address = EXCLUDED.gps_address,
                photo_timestamp = EXCLUDED.photo_timestamp,
                is_gps_valid = EXCLUDED.is_gps_valid,
                device_audit = EXCLUDED.device_audit,
                device_fingerprint = EXCLUDED.device_fingerprint,
                approved_by = NULL,
                approved_at = NULL,
                updated_at = NOW()
            RETURNING {ALL_COLUMNS}
            "#
        );

        sqlx::query_as::<_, ChecklistEntry>(&sql)
            .bind(Uuid::new_v4())
            .bind(&form.location)
            .bind(form.day)
            .bind(form.month)
            .bind(form.year)
            .bind(form.score)
            .bind(photo_url)
            .bind(uploaded_by)
            .bind(coord.map(|c| c.latitude))
            .bind(coord.map(|c| c.longitude))
            .bind(gps_address)
            .bind(form.photo_timestamp)
            .bind(is_gps_valid)
            .bind(device_audit.map(Json))
            .bind(device_fingerprint)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to upsert checklist entry: {:?}", e);
                AppError::Database(e)
            })
    }

    /// Resolve the address off the write path and replace the placeholder.
    /// The lookup never fails outward, so the placeholder is always
    /// replaced — with the resolved address or the coordinate fallback.
    fn spawn_address_resolution(&self, entry_id: Uuid, coord: Coordinate) {
        let geocoder = Arc::clone(&self.geocoder);
        let pool = self.pool.clone();
        let feed = Arc::clone(&self.feed);
        let fraud_policy = Arc::clone(&self.fraud_policy);

        tokio::spawn(async move {
            let address = geocoder.resolve(&coord).await;

            let updated = sqlx::query_as::<_, ChecklistEntry>(&format!(
                "UPDATE checklist_entries SET gps_address = $2 WHERE id = $1 RETURNING {ALL_COLUMNS}"
            ))
            .bind(entry_id)
            .bind(&address.formatted)
            .fetch_optional(&pool)
            .await;

            match updated {
                Ok(Some(entry)) => {
                    feed.publish(EntryEvent::Updated {
                        entry: ChecklistEntryDto::from_entry(&entry, &fraud_policy),
                    });
                }
                Ok(None) => {
                    // entry deleted while the lookup was in flight
                    tracing::debug!("Entry {} gone before address resolution", entry_id);
                }
                Err(e) => {
                    tracing::error!("Failed to store resolved address: {:?}", e);
                }
            }
        });
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// List entries, newest first, optionally scoped to a month/year.
    /// Returns (entries, total_count).
    pub async fn list(
        &self,
        month: Option<i32>,
        year: Option<i32>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<ChecklistEntry>, i64)> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM checklist_entries
            WHERE ($1::int IS NULL OR month = $1)
              AND ($2::int IS NULL OR year = $2)
            "#,
        )
        .bind(month)
        .bind(year)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count checklist entries: {:?}", e);
            AppError::Database(e)
        })?;

        let entries = sqlx::query_as::<_, ChecklistEntry>(&format!(
            r#"
            SELECT {ALL_COLUMNS}
            FROM checklist_entries
            WHERE ($1::int IS NULL OR month = $1)
              AND ($2::int IS NULL OR year = $2)
            ORDER BY created_at DESC
            OFFSET $3 LIMIT $4
            "#
        ))
        .bind(month)
        .bind(year)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list checklist entries: {:?}", e);
            AppError::Database(e)
        })?;

        Ok((entries, total))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<ChecklistEntry> {
        sqlx::query_as::<_, ChecklistEntry>(&format!(
            "SELECT {ALL_COLUMNS} FROM checklist_entries WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get checklist entry: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Checklist entry {} not found", id)))
    }

    // ========================================================================
    // Approval / deletion
    // ========================================================================

    /// Record approval. Touches only the approval fields.
    pub async fn approve(&self, id: Uuid, approved_by: &str) -> Result<ChecklistEntry> {
        let entry = sqlx::query_as::<_, ChecklistEntry>(&format!(
            r#"
            UPDATE checklist_entries
            SET approved_by = $2, approved_at = NOW()
            WHERE id = $1
            RETURNING {ALL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(approved_by)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to approve checklist entry: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Checklist entry {} not found", id)))?;

        tracing::info!("Entry {} approved by {}", id, approved_by);

        self.feed.publish(EntryEvent::Updated {
            entry: ChecklistEntryDto::from_entry(&entry, &self.fraud_policy),
        });

        Ok(entry)
    }

    /// Privileged delete; also removes the stored photo when it lives in
    /// our bucket.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let entry = self.get_by_id(id).await?;

        sqlx::query("DELETE FROM checklist_entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete checklist entry: {:?}", e);
                AppError::Database(e)
            })?;

        if let Some(key) = self.storage.extract_key_from_url(&entry.photo_url) {
            if let Err(e) = self.storage.delete(&key).await {
                tracing::warn!("Failed to delete photo '{}': {}", key, e);
            }
        }

        tracing::info!("Entry {} deleted", id);
        self.feed.publish(EntryEvent::Deleted { id });

        Ok(())
    }
}

/// Parse an RFC 3339 capture timestamp from a multipart text field
pub fn parse_photo_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::BadRequest(format!("Invalid photo_timestamp: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_photo_timestamp_accepts_rfc3339() {
        let ts = parse_photo_timestamp("2025-10-05T14:30:05+07:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-10-05T07:30:05+00:00");
    }

    #[test]
    fn test_parse_photo_timestamp_rejects_garbage() {
        assert!(parse_photo_timestamp("yesterday").is_err());
    }
}
