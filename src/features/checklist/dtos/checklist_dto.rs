use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::checklist::models::{ChecklistEntry, DeviceAudit};
use crate::features::fraud::engine::{classify, FraudFlag, FraudPolicy};
use crate::shared::constants::maps_link;
use crate::shared::validation::LOCATION_REGEX;

/// Photo MIME types accepted for submission
pub const ALLOWED_PHOTO_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

pub fn is_photo_type_allowed(content_type: &str) -> bool {
    ALLOWED_PHOTO_TYPES.contains(&content_type)
}

/// Multipart form for submitting a checklist photo.
///
/// Schema-only type: the handler reads the multipart stream manually and
/// assembles a [`SubmitChecklistForm`].
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct SubmitChecklistDto {
    /// Photo to watermark and store
    #[schema(value_type = String, format = Binary)]
    pub photo: String,
    pub location: String,
    pub day: i32,
    pub month: i32,
    pub year: i32,
    pub score: i32,
    /// Client-supplied fix; omitted when the device had no GPS
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Capture timestamp reported by the camera (RFC 3339)
    pub photo_timestamp: Option<String>,
    /// JSON-encoded device audit fields
    pub device_info: Option<String>,
}

/// Parsed and validated submission fields
#[derive(Debug, Validate)]
pub struct SubmitChecklistForm {
    #[validate(regex(path = *LOCATION_REGEX), length(min = 1, max = 120))]
    pub location: String,

    #[validate(range(min = 1, max = 31))]
    pub day: i32,

    #[validate(range(min = 1, max = 12))]
    pub month: i32,

    #[validate(range(min = 2000, max = 2100))]
    pub year: i32,

    #[validate(range(min = 0, max = 100))]
    pub score: i32,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,

    pub photo_timestamp: Option<DateTime<Utc>>,

    pub device: Option<DeviceAuditInput>,
}

impl SubmitChecklistForm {
    /// Calendar coherence beyond per-field ranges (e.g. 31 February).
    pub fn validate_calendar_date(&self) -> Result<(), String> {
        NaiveDate::from_ymd_opt(self.year, self.month as u32, self.day as u32)
            .map(|_| ())
            .ok_or_else(|| {
                format!(
                    "Invalid calendar date: {:02}-{:02}-{}",
                    self.day, self.month, self.year
                )
            })
    }
}

/// Device audit fields as submitted by the client
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DeviceAuditInput {
    pub platform: String,
    pub locale: String,
    pub screen: String,
    pub client_timestamp: DateTime<Utc>,
}

impl DeviceAuditInput {
    pub fn into_audit(self) -> DeviceAudit {
        DeviceAudit {
            schema_version: DeviceAudit::SCHEMA_VERSION,
            platform: self.platform,
            locale: self.locale,
            screen: self.screen,
            client_timestamp: self.client_timestamp,
        }
    }
}

/// Query parameters for listing checklist entries
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ChecklistQuery {
    /// Filter by month (1-12)
    pub month: Option<i32>,
    /// Filter by year
    pub year: Option<i32>,
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    crate::shared::constants::DEFAULT_PAGE_SIZE
}

impl ChecklistQuery {
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }

    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, crate::shared::constants::MAX_PAGE_SIZE)
    }
}

/// Checklist entry as returned to clients. The fraud flag is derived at
/// response time, never read from storage.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChecklistEntryDto {
    pub id: Uuid,
    pub location: String,
    pub day: i32,
    pub month: i32,
    pub year: i32,
    pub score: i32,
    pub photo_url: String,
    pub uploaded_by: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub gps_address: Option<String>,
    pub photo_timestamp: Option<DateTime<Utc>>,
    pub is_gps_valid: Option<bool>,
    pub fraud_flag: FraudFlag,
    /// Manual-verification map link when coordinates are present
    pub map_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl ChecklistEntryDto {
    pub fn from_entry(entry: &ChecklistEntry, policy: &FraudPolicy) -> Self {
        let fraud_flag = classify(entry, policy);
        let map_url = entry
            .coordinate()
            .map(|c| maps_link(c.latitude, c.longitude));

        Self {
            id: entry.id,
            location: entry.location.clone(),
            day: entry.day,
            month: entry.month,
            year: entry.year,
            score: entry.score,
            photo_url: entry.photo_url.clone(),
            uploaded_by: entry.uploaded_by.clone(),
            latitude: entry.latitude,
            longitude: entry.longitude,
            gps_address: entry.gps_address.clone(),
            photo_timestamp: entry.photo_timestamp,
            is_gps_valid: entry.is_gps_valid,
            fraud_flag,
            map_url,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
            approved_by: entry.approved_by.clone(),
            approved_at: entry.approved_at,
        }
    }
}

/// Upsert payload for a location's reference coordinates
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpsertExpectedLocationDto {
    #[validate(regex(path = *LOCATION_REGEX), length(min = 1, max = 120))]
    pub location: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    /// Proximity tolerance in meters (default 100)
    #[validate(range(min = 1.0, max = 100_000.0))]
    pub tolerance_m: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExpectedLocationDto {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub tolerance_m: f64,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::features::checklist::models::ExpectedLocation> for ExpectedLocationDto {
    fn from(model: crate::features::checklist::models::ExpectedLocation) -> Self {
        Self {
            location: model.location,
            latitude: model.latitude,
            longitude: model.longitude,
            tolerance_m: model.tolerance_m,
            updated_at: model.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> SubmitChecklistForm {
        SubmitChecklistForm {
            location: "Toilet Lobby".to_string(),
            day: 5,
            month: 10,
            year: 2025,
            score: 90,
            latitude: Some(-6.2088),
            longitude: Some(106.8456),
            photo_timestamp: None,
            device: None,
        }
    }

    #[test]
    fn test_valid_form_passes() {
        let f = form();
        assert!(f.validate().is_ok());
        assert!(f.validate_calendar_date().is_ok());
    }

    #[test]
    fn test_score_out_of_range_fails() {
        let mut f = form();
        f.score = 101;
        assert!(f.validate().is_err());
    }

    #[test]
    fn test_latitude_out_of_range_fails() {
        let mut f = form();
        f.latitude = Some(93.0);
        assert!(f.validate().is_err());
    }

    #[test]
    fn test_impossible_calendar_date_fails() {
        let mut f = form();
        f.day = 31;
        f.month = 2;
        assert!(f.validate().is_ok()); // per-field ranges pass
        assert!(f.validate_calendar_date().is_err());
    }
}
