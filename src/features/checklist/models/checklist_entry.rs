use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::types::Json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::geo::coordinate::Coordinate;

/// Typed device audit record captured at submission time.
///
/// Audit-only: never consulted by any validation decision. The schema
/// version guards against silent shape drift in the jsonb column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeviceAudit {
    pub schema_version: i32,
    pub platform: String,
    pub locale: String,
    pub screen: String,
    pub client_timestamp: DateTime<Utc>,
}

impl DeviceAudit {
    pub const SCHEMA_VERSION: i32 = 1;

    /// Stable hex digest over the audit fields, stored alongside the record
    /// so identical devices can be grouped without parsing the jsonb.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.platform.as_bytes());
        hasher.update(b"|");
        hasher.update(self.locale.as_bytes());
        hasher.update(b"|");
        hasher.update(self.screen.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Database model for one inspection record.
///
/// The `(location, day, month, year)` tuple is the unique logical slot:
/// re-submitting the same slot replaces the row via upsert.
#[derive(Debug, Clone, FromRow)]
pub struct ChecklistEntry {
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
    pub device_audit: Option<Json<DeviceAudit>>,
    pub device_fingerprint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl ChecklistEntry {
    /// Both coordinates, when present.
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => None,
        }
    }
}

/// Data for creating or replacing a checklist entry
#[derive(Debug)]
pub struct NewChecklistEntry {
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
    pub device_audit: Option<DeviceAudit>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audit() -> DeviceAudit {
        DeviceAudit {
            schema_version: DeviceAudit::SCHEMA_VERSION,
            platform: "Android 14".to_string(),
            locale: "id-ID".to_string(),
            screen: "1080x2400".to_string(),
            client_timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_fingerprint_is_stable_and_hex() {
        let a = audit();
        let fp1 = a.fingerprint();
        let fp2 = a.fingerprint();
        assert_eq!(fp1, fp2);
        assert_eq!(fp1.len(), 64);
        assert!(fp1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_ignores_client_timestamp() {
        let mut a = audit();
        let fp1 = a.fingerprint();
        a.client_timestamp = a.client_timestamp + chrono::Duration::hours(3);
        assert_eq!(fp1, a.fingerprint());
    }

    #[test]
    fn test_fingerprint_differs_per_device() {
        let a = audit();
        let mut b = audit();
        b.platform = "iOS 18".to_string();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
